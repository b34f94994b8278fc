use crate::models::AppData;
use crate::payloads::ChecklistItem;

/// Getting-started checklist for the current visitor. Open steps link to
/// their section on the start page.
pub fn checklist(data: &AppData, user_id: Option<&str>) -> Vec<ChecklistItem> {
    let membership = user_id.and_then(|id| data.memberships_of(id).into_iter().next());
    let has_entry = membership.is_some_and(|m| {
        data.entries
            .values()
            .any(|e| e.user_id == m.user_id && e.challenge_id.as_deref() == Some(m.challenge_id.as_str()))
    });

    let item = |id: &'static str, label: &'static str, done: bool, href: &'static str| ChecklistItem {
        id,
        label,
        done,
        href: (!done).then_some(href),
    };
    vec![
        item("account", "Konto anlegen oder anmelden", user_id.is_some(), "/#account"),
        item("join", "Einer Challenge beitreten", membership.is_some(), "/#join"),
        item("daily", "Ersten Tageseintrag abgeben", has_entry, "/#today"),
    ]
}
