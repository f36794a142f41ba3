use crate::entries::dto::Entry;

/// Sums shown on the dashboard for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayTotals {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl DayTotals {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, e| Self {
            calories_kcal: acc.calories_kcal + e.calories_kcal,
            protein_g: acc.protein_g + e.protein_g,
            carbs_g: acc.carbs_g + e.carbs_g,
            fat_g: acc.fat_g + e.fat_g,
        })
    }
}

/// Whole percent of `target` reached, capped at 100. `None` without a
/// positive target.
pub fn percent_of(value: f64, target: Option<f64>) -> Option<u8> {
    let target = target.filter(|t| *t > 0.0)?;
    Some((value / target * 100.0).round().clamp(0.0, 100.0) as u8)
}
