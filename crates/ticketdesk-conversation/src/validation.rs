// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure validation rules for registration and ticket drafts.
//!
//! Nothing here performs I/O. Rejections carry a reason; birth-date reasons are
//! shown to the user verbatim.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use ticketdesk_core::DeskError;
use ticketdesk_core::types::Category;

pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const MIN_AGE_YEARS: i32 = 14;
pub const MAX_AGE_YEARS: i32 = 120;

const TITLE_WORDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("некорректное ФИО")]
    FullName,

    #[error("описание должно содержать от 10 до 1000 символов, получено {chars}")]
    DescriptionLength { chars: usize },

    #[error("неизвестная категория")]
    UnknownCategory,

    #[error("неверный формат даты, используйте ДД.ММ.ГГГГ")]
    MalformedDate,

    #[error("дата рождения не может быть в будущем")]
    BirthDateInFuture,

    #[error("возраст должен быть не менее 14 лет")]
    TooYoung,

    #[error("возраст не может превышать 120 лет")]
    TooOld,
}

impl From<ValidationError> for DeskError {
    fn from(err: ValidationError) -> Self {
        DeskError::Validation(err.to_string())
    }
}

/// At least two whitespace-separated tokens, each at least two characters.
///
/// Returns the name with whitespace collapsed to single spaces.
pub fn validate_full_name(input: &str) -> Result<String, ValidationError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.len() < 2 || tokens.iter().any(|t| t.chars().count() < 2) {
        return Err(ValidationError::FullName);
    }
    Ok(tokens.join(" "))
}

/// Description length within [10, 1000] characters after trimming.
pub fn validate_description(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let chars = trimmed.chars().count();
    if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&chars) {
        return Err(ValidationError::DescriptionLength { chars });
    }
    Ok(trimmed.to_string())
}

/// Strip leading decoration (emoji, punctuation, spaces) and lowercase.
///
/// `"❌ Отмена"` and `"отмена"` normalize to the same string.
pub fn normalize_label(input: &str) -> String {
    input
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim()
        .to_lowercase()
}

/// Map keyboard text onto exactly one category.
pub fn parse_category(input: &str) -> Result<Category, ValidationError> {
    let wanted: String = normalize_label(input)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    Category::ALL
        .into_iter()
        .find(|c| c.label().to_lowercase() == wanted)
        .ok_or(ValidationError::UnknownCategory)
}

/// Parse a `DD.MM.YYYY` birth date and check it is plausible relative to `today`.
pub fn validate_birth_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(input.trim(), "%d.%m.%Y")
        .map_err(|_| ValidationError::MalformedDate)?;

    if date > today {
        return Err(ValidationError::BirthDateInFuture);
    }

    let age = age_on(date, today);
    if age < MIN_AGE_YEARS {
        return Err(ValidationError::TooYoung);
    }
    if age > MAX_AGE_YEARS {
        return Err(ValidationError::TooOld);
    }
    Ok(date)
}

/// Whole years between `birth` and `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// `"<Category label>: <first four words>"`, with `...` when words were dropped.
pub fn generate_title(category: Category, description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().collect();
    let mut short = words
        .iter()
        .take(TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > TITLE_WORDS {
        short.push_str("...");
    }
    format!("{}: {short}", category.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_name_rules() {
        assert_eq!(validate_full_name("Ivan Petrov").unwrap(), "Ivan Petrov");
        assert_eq!(
            validate_full_name("  Иванов   Иван  Иванович ").unwrap(),
            "Иванов Иван Иванович"
        );
        assert_eq!(validate_full_name("Ivan"), Err(ValidationError::FullName));
        assert_eq!(validate_full_name("I P"), Err(ValidationError::FullName));
        assert_eq!(validate_full_name("Ян Я"), Err(ValidationError::FullName));
        assert_eq!(validate_full_name(""), Err(ValidationError::FullName));
    }

    #[test]
    fn cyrillic_tokens_count_characters_not_bytes() {
        assert!(validate_full_name("Ян Ли").is_ok());
        assert!(validate_full_name("Я Ли").is_err());
    }

    #[test]
    fn description_boundaries() {
        assert!(validate_description(&"я".repeat(9)).is_err());
        assert!(validate_description(&"я".repeat(10)).is_ok());
        assert!(validate_description(&"я".repeat(1000)).is_ok());
        assert_eq!(
            validate_description(&"я".repeat(1001)),
            Err(ValidationError::DescriptionLength { chars: 1001 })
        );
    }

    #[test]
    fn category_alias_equivalence() {
        assert_eq!(parse_category("💭 Вопрос").unwrap(), Category::Question);
        assert_eq!(parse_category("Вопрос").unwrap(), Category::Question);
        assert_eq!(
            parse_category("💭 Вопрос").unwrap().to_string(),
            parse_category("Вопрос").unwrap().to_string()
        );
        assert_eq!(parse_category("🚨 Важно,Срочно").unwrap(), Category::Urgent);
        assert_eq!(parse_category("важно, срочно").unwrap(), Category::Urgent);
        assert_eq!(parse_category("💰 Финансы").unwrap(), Category::Finance);
        assert_eq!(
            parse_category("Ремонт"),
            Err(ValidationError::UnknownCategory)
        );
        assert_eq!(parse_category("❌ Отмена"), Err(ValidationError::UnknownCategory));
    }

    #[test]
    fn birth_date_rules() {
        let today = day(2026, 6, 15);
        assert_eq!(
            validate_birth_date("31.12.2999", today),
            Err(ValidationError::BirthDateInFuture)
        );
        assert_eq!(
            validate_birth_date("15.06.2013", today),
            Err(ValidationError::TooYoung)
        );
        assert_eq!(
            validate_birth_date("15.06.1996", today).unwrap(),
            day(1996, 6, 15)
        );
        assert_eq!(
            validate_birth_date("15.06.1896", today),
            Err(ValidationError::TooOld)
        );
        assert_eq!(
            validate_birth_date("1996-06-15", today),
            Err(ValidationError::MalformedDate)
        );
        assert_eq!(
            validate_birth_date("", today),
            Err(ValidationError::MalformedDate)
        );
    }

    #[test]
    fn fourteenth_birthday_is_the_first_accepted_day() {
        let today = day(2026, 6, 15);
        assert!(validate_birth_date("15.06.2012", today).is_ok());
        assert_eq!(
            validate_birth_date("16.06.2012", today),
            Err(ValidationError::TooYoung)
        );
    }

    #[test]
    fn birth_date_reasons_are_user_facing() {
        assert_eq!(
            ValidationError::BirthDateInFuture.to_string(),
            "дата рождения не может быть в будущем"
        );
        assert_eq!(
            ValidationError::TooYoung.to_string(),
            "возраст должен быть не менее 14 лет"
        );
        assert_eq!(
            ValidationError::TooOld.to_string(),
            "возраст не может превышать 120 лет"
        );
    }

    #[test]
    fn title_truncates_after_four_words() {
        let title = generate_title(
            Category::Question,
            "не работает принтер в третьем кабинете",
        );
        assert_eq!(title, "Вопрос: не работает принтер в...");

        let short = generate_title(Category::Question, "сломался мой ноутбук");
        assert_eq!(short, "Вопрос: сломался мой ноутбук");
        assert!(!short.ends_with("..."));
    }

    #[test]
    fn normalize_label_strips_decoration() {
        assert_eq!(normalize_label("⬅️ Назад"), "назад");
        assert_eq!(normalize_label("  ✅ Да "), "да");
        assert_eq!(normalize_label("Нет"), "нет");
    }

    #[test]
    fn validation_error_converts_to_desk_error() {
        let err: DeskError = ValidationError::FullName.into();
        assert!(matches!(err, DeskError::Validation(_)));
    }

    proptest! {
        #[test]
        fn description_accepts_exactly_the_bounded_lengths(len in 0usize..1200) {
            let text = "ж".repeat(len);
            let accepted = validate_description(&text).is_ok();
            prop_assert_eq!(accepted, (10..=1000).contains(&len));
        }

        #[test]
        fn title_never_holds_more_than_four_description_words(
            words in proptest::collection::vec("[а-я]{1,8}", 1..12)
        ) {
            let description = words.join(" ");
            let title = generate_title(Category::Finance, &description);
            let body = title.strip_prefix("Финансы: ").unwrap();
            let body = body.strip_suffix("...").unwrap_or(body);
            prop_assert_eq!(body.split_whitespace().count(), words.len().min(4));
            prop_assert_eq!(title.ends_with("..."), words.len() > 4);
        }
    }
}
