use chrono::NaiveDate;

/// The version constant the original automation started out with. It is
/// shadowed by [`date_version`] in the prepare step before anything reads
/// it; the overwrite is preserved because the intent behind the constant
/// cannot be confirmed from the source.
pub const INITIAL_VERSION: &str = "2.12";

/// Nightly builds are versioned by the run date, `YYYY.MM.DD`.
pub fn date_version(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_version_is_dotted_and_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2018, 1, 5).expect("valid date");
        assert_eq!(date_version(date), "2018.01.05");
    }

    #[test]
    fn date_version_differs_from_initial_constant() {
        let date = NaiveDate::from_ymd_opt(2018, 12, 31).expect("valid date");
        assert_ne!(date_version(date), INITIAL_VERSION);
    }
}
