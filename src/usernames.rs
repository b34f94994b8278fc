use crate::models::AppData;

const ADJECTIVES: &[&str] = &[
    "mutig", "flink", "klug", "heiter", "neugierig", "tapfer", "freundlich", "witzig", "hell", "sanft",
    "ruhig", "klar", "achtsam", "frisch", "schnell", "weise", "wach", "gelassen", "stark", "treu",
    "listig", "fröhlich", "neugierig", "geduldig", "furchtlos", "zäh", "kühn", "lebhaft", "smart", "fix",
];

#[derive(Clone, Copy)]
enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

impl Gender {
    fn adjective_ending(self) -> &'static str {
        match self {
            Self::Masculine => "er",
            Self::Feminine => "e",
            Self::Neuter => "es",
        }
    }
}

const ANIMALS: &[(&str, Gender)] = &[
    ("Fuchs", Gender::Masculine),
    ("Panda", Gender::Masculine),
    ("Falke", Gender::Masculine),
    ("Otter", Gender::Masculine),
    ("Luchs", Gender::Masculine),
    ("Dachs", Gender::Masculine),
    ("Eule", Gender::Feminine),
    ("Wal", Gender::Masculine),
    ("Delfin", Gender::Masculine),
    ("Biber", Gender::Masculine),
    ("Marder", Gender::Masculine),
    ("Wolf", Gender::Masculine),
    ("Hirsch", Gender::Masculine),
    ("Möwe", Gender::Feminine),
    ("Rabe", Gender::Masculine),
    ("Spatz", Gender::Masculine),
    ("Iltis", Gender::Masculine),
    ("Milan", Gender::Masculine),
    ("Schwan", Gender::Masculine),
    ("Zebra", Gender::Neuter),
    ("Giraffe", Gender::Feminine),
    ("Leopard", Gender::Masculine),
    ("Nashorn", Gender::Neuter),
    ("Flamingo", Gender::Masculine),
    ("Krokodil", Gender::Neuter),
    ("Kamel", Gender::Neuter),
];

const SUGGEST_ATTEMPTS: usize = 12;

/// Deterministic pseudonym such as `mutigerFuchs` derived from a seed.
pub fn anonymous_username(seed: &str) -> String {
    let sum = seed
        .bytes()
        .filter(u8::is_ascii_alphanumeric)
        .fold(0u64, |acc, b| (acc + u64::from(b)) % 1_000_000_000);
    let adjective = ADJECTIVES[(sum % ADJECTIVES.len() as u64) as usize];
    let (animal, gender) = ANIMALS[((sum / 7) % ANIMALS.len() as u64) as usize];
    format!("{adjective}{}{animal}", gender.adjective_ending())
}

pub fn random_username() -> String {
    anonymous_username(&uuid::Uuid::new_v4().to_string())
}

/// Suggests a pseudonym nobody uses yet; after too many collisions the last
/// candidate is returned as is.
pub fn suggest_unique(data: &AppData) -> String {
    let mut candidate = random_username();
    for _ in 1..SUGGEST_ATTEMPTS {
        if data.user_by_username(&candidate).is_none() {
            return candidate;
        }
        candidate = random_username();
    }
    candidate
}
