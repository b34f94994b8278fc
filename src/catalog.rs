use crate::models::{new_id, Action, AppData, Polarity};
use tracing::info;

struct SeedAction {
    code: &'static str,
    label: &'static str,
    category: &'static str,
    weight: i32,
}

const SEED_ACTIONS: &[SeedAction] = &[
    SeedAction { code: "COMM_DONATION", label: "Spende für Wohltätigkeit", category: "Public", weight: 5 },
    SeedAction { code: "SAFE_REPORT", label: "Öffentliche Gefahren gemeldet", category: "Public", weight: 3 },
    SeedAction { code: "PUBLIC_AWARD", label: "Öffentliche Auszeichnung erhalten", category: "Public", weight: 3 },
    SeedAction { code: "PUBLIC_HELP", label: "Jemandem geholfen (Tragen, Auskunft)", category: "Public", weight: 2 },
    SeedAction { code: "RECYCLE_OK", label: "Recycling korrekt", category: "Public", weight: 1 },
    SeedAction { code: "WORK_PROMO", label: "Beförderung/Auszeichnung am Arbeitsplatz", category: "Work", weight: 4 },
    SeedAction { code: "WORK_PROJECT_DONE", label: "Projekt termingerecht abgeschlossen", category: "Work", weight: 3 },
    SeedAction { code: "WORK_HELP_COLLEAGUE", label: "Kolleg:in unterstützt", category: "Work", weight: 2 },
    SeedAction { code: "APPT_KEPT", label: "Termin eingehalten", category: "Private", weight: 2 },
    SeedAction { code: "BILL_ON_TIME", label: "Rechnung pünktlich bezahlt", category: "Private", weight: 2 },
    SeedAction { code: "HEALTHCARE_VISIT", label: "Arzttermin wahrgenommen", category: "Private", weight: 1 },
    SeedAction { code: "ONLINE_KIND", label: "Online freundlich/konstruktiv geäußert", category: "Digital", weight: 1 },
    SeedAction { code: "ONLINE_REPORT_SCAM", label: "Fake/Scam gemeldet (bestätigt)", category: "Digital", weight: 2 },
    SeedAction { code: "FARE_EVASION", label: "ÖV ohne Ticket", category: "Public", weight: -3 },
    SeedAction { code: "LITTERING", label: "Littering (Müll liegenlassen)", category: "Public", weight: -2 },
    SeedAction { code: "CREATE_RISK", label: "Öffentliches Risiko geschaffen", category: "Public", weight: -3 },
    SeedAction { code: "SPEEDING", label: "Geschwindigkeit überschritten", category: "Public", weight: -3 },
    SeedAction { code: "JAYWALK", label: "Straße ohne Zebrastreifen überquert", category: "Public", weight: -1 },
    SeedAction { code: "ACCIDENT_FAULT", label: "Verkehrsunfall verschuldet", category: "Public", weight: -5 },
    SeedAction { code: "WORK_NO_SHOW", label: "Unentschuldigtes Fehlen", category: "Work", weight: -3 },
    SeedAction { code: "WORK_MISS_DEADLINE", label: "Deadline verpasst", category: "Work", weight: -2 },
    SeedAction { code: "APPT_MISSED", label: "Termin verpasst (ohne Absage)", category: "Private", weight: -2 },
    SeedAction { code: "BILL_LATE", label: "Rechnung verspätet bezahlt", category: "Private", weight: -2 },
    SeedAction { code: "DUNNING", label: "Mahnung erhalten", category: "Private", weight: -3 },
    SeedAction { code: "ONLINE_RUDE", label: "Online unfreundlich/beleidigend", category: "Digital", weight: -2 },
    SeedAction { code: "ONLINE_MISINFO", label: "Falschinfo geteilt", category: "Digital", weight: -3 },
    SeedAction { code: "PIRACY", label: "Illegale Downloads/Streaming", category: "Digital", weight: -2 },
];

/// Upserts the built-in action catalog by code. Returns the number of new actions.
pub fn seed_actions(data: &mut AppData) -> usize {
    let mut created = 0;
    for seed in SEED_ACTIONS {
        let polarity = if seed.weight < 0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        };
        if let Some(existing) = data.actions.values_mut().find(|a| a.code == seed.code) {
            existing.label = seed.label.to_string();
            existing.category = seed.category.to_string();
            existing.weight = seed.weight;
            existing.polarity = polarity;
            continue;
        }
        let action = Action {
            id: new_id(),
            code: seed.code.to_string(),
            label: seed.label.to_string(),
            category: seed.category.to_string(),
            weight: seed.weight,
            polarity,
        };
        data.actions.insert(action.id.clone(), action);
        created += 1;
    }
    if created > 0 {
        info!(created, "seeded action catalog");
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent() {
        let mut data = AppData::default();
        assert_eq!(seed_actions(&mut data), SEED_ACTIONS.len());
        let ids: Vec<String> = data.actions.keys().cloned().collect();

        assert_eq!(seed_actions(&mut data), 0);
        let again: Vec<String> = data.actions.keys().cloned().collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn seeding_refreshes_changed_weights() {
        let mut data = AppData::default();
        seed_actions(&mut data);
        for action in data.actions.values_mut() {
            if action.code == "LITTERING" {
                action.weight = 9;
                action.polarity = Polarity::Positive;
            }
        }
        seed_actions(&mut data);
        let littering = data
            .actions
            .values()
            .find(|a| a.code == "LITTERING")
            .expect("littering action");
        assert_eq!(littering.weight, -2);
        assert_eq!(littering.polarity, Polarity::Negative);
    }

    #[test]
    fn catalog_has_both_polarities() {
        let positive = SEED_ACTIONS.iter().filter(|a| a.weight > 0).count();
        let negative = SEED_ACTIONS.iter().filter(|a| a.weight < 0).count();
        assert_eq!(positive, 13);
        assert_eq!(negative, 14);
    }
}
