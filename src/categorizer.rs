use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExpenseCategory {
    Medical,
    Food,
    Supplies,
    Transport,
    SpayNeuter,
    Vaccinations,
    Microchipping,
    Facilities,
    Administration,
    Operations,
}

impl ExpenseCategory {
    /// Every category in matching priority order; `Operations` is the fallback.
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::Medical,
        ExpenseCategory::Food,
        ExpenseCategory::Supplies,
        ExpenseCategory::Transport,
        ExpenseCategory::SpayNeuter,
        ExpenseCategory::Vaccinations,
        ExpenseCategory::Microchipping,
        ExpenseCategory::Facilities,
        ExpenseCategory::Administration,
        ExpenseCategory::Operations,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Medical => "Medical",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::Transport => "Transport",
            ExpenseCategory::SpayNeuter => "Spay/Neuter",
            ExpenseCategory::Vaccinations => "Vaccinations",
            ExpenseCategory::Microchipping => "Microchipping",
            ExpenseCategory::Facilities => "Facilities",
            ExpenseCategory::Administration => "Administration",
            ExpenseCategory::Operations => "Operations",
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// Order matters: the first matching pattern wins.
const RULES: &[(ExpenseCategory, &str)] = &[
    (
        ExpenseCategory::Medical,
        r"\bvet\b|veterinar|medic|clinic|surgery|\bexam|checkup|check-up|prescription|antibiotic|hospital|dental|x-ray|bloodwork",
    ),
    (
        ExpenseCategory::Food,
        r"\bfood\b|kibble|\btreats?\b|canned|wet food|dry food|formula|chewy",
    ),
    (
        ExpenseCategory::Supplies,
        r"suppl(y|ies)|litter|\btoys?\b|bedding|blankets?|\bcrates?\b|carriers?|bowls?|scratch|collars?",
    ),
    (
        ExpenseCategory::Transport,
        r"transport|\bgas\b|\bfuel\b|mileage|\buber\b|\blyft\b|\btaxi\b|parking|\btolls?\b",
    ),
    (ExpenseCategory::SpayNeuter, r"\bspay|neuter"),
    (
        ExpenseCategory::Vaccinations,
        r"vaccin|rabies|fvrcp|booster|\bshots?\b",
    ),
    (ExpenseCategory::Microchipping, r"microchip|\bchip\b"),
    (
        ExpenseCategory::Facilities,
        r"\brent\b|lease|utilit|electric|\bwater\b|repair|maintenance|cleaning|facilit",
    ),
    (
        ExpenseCategory::Administration,
        r"office|admin|software|website|hosting|postage|insurance|\bfees?\b|licen[cs]e|accounting|legal|bank",
    ),
];

static COMPILED: Lazy<Vec<(ExpenseCategory, Regex)>> = Lazy::new(|| {
    RULES
        .iter()
        .filter_map(|(category, pattern)| Regex::new(pattern).ok().map(|re| (*category, re)))
        .collect()
});

/// Classify an expense from its free-text description and vendor.
pub fn categorize_expense(description: &str, vendor: Option<&str>) -> ExpenseCategory {
    let haystack = format!("{} {}", description, vendor.unwrap_or_default()).to_lowercase();
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(&haystack))
        .map(|(category, _)| *category)
        .unwrap_or(ExpenseCategory::Operations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED.len(), RULES.len());
    }

    #[test]
    fn test_basic_categories() {
        assert_eq!(categorize_expense("Vet visit for checkup", None), ExpenseCategory::Medical);
        assert_eq!(categorize_expense("20lb bag of kibble", None), ExpenseCategory::Food);
        assert_eq!(categorize_expense("Litter box supplies", None), ExpenseCategory::Supplies);
        assert_eq!(categorize_expense("Miscellaneous item", None), ExpenseCategory::Operations);
    }

    #[test]
    fn test_each_category_reachable() {
        let cases = [
            ("Gas for adoption event run", ExpenseCategory::Transport),
            ("Spay for Whiskers", ExpenseCategory::SpayNeuter),
            ("Rabies booster", ExpenseCategory::Vaccinations),
            ("Microchip registration", ExpenseCategory::Microchipping),
            ("Monthly rent", ExpenseCategory::Facilities),
            ("Postage stamps", ExpenseCategory::Administration),
        ];
        for (description, expected) in cases {
            assert_eq!(categorize_expense(description, None), expected, "{description}");
        }
    }

    #[test]
    fn test_priority_order() {
        // Medical outranks Spay/Neuter.
        assert_eq!(categorize_expense("Spay surgery", None), ExpenseCategory::Medical);
        // Food outranks Supplies.
        assert_eq!(categorize_expense("Food bowls and kibble", None), ExpenseCategory::Food);
        // Supplies outranks Transport.
        assert_eq!(categorize_expense("Cat carrier for transport", None), ExpenseCategory::Supplies);
        // Vaccinations outrank Microchipping.
        assert_eq!(categorize_expense("FVRCP shot and microchip", None), ExpenseCategory::Vaccinations);
        // Facilities outrank Administration.
        assert_eq!(categorize_expense("Office cleaning", None), ExpenseCategory::Facilities);
    }

    #[test]
    fn test_vendor_participates() {
        assert_eq!(
            categorize_expense("Order #4412", Some("Northside Veterinary Hospital")),
            ExpenseCategory::Medical
        );
        assert_eq!(categorize_expense("Order #4413", Some("Chewy")), ExpenseCategory::Food);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize_expense("KIBBLE", None), ExpenseCategory::Food);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ExpenseCategory::SpayNeuter.to_string(), "Spay/Neuter");
        assert_eq!(ExpenseCategory::ALL.len(), 10);
        assert_eq!(ExpenseCategory::ALL[0], ExpenseCategory::Medical);
        assert_eq!(ExpenseCategory::ALL[9], ExpenseCategory::Operations);
    }
}
