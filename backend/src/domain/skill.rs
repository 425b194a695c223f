//! Skills catalogue and mentor proficiency.

use uuid::Uuid;

use super::UserId;

/// Maximum skill name length.
pub const SKILL_NAME_MAX: usize = 64;
/// Inclusive proficiency bounds.
pub const PROFICIENCY_RANGE: std::ops::RangeInclusive<i16> = 1..=10;

/// Validation errors for skills.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillValidationError {
    #[error("skill name must not be empty")]
    EmptyName,
    #[error("skill name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("skill name must contain at least one letter or digit")]
    NoAlphanumerics,
    #[error("proficiency must be between 1 and 10, got {value}")]
    ProficiencyOutOfRange { value: i16 },
}

/// Catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Skill {
    /// Validate a name and derive its slug.
    pub fn new(id: Uuid, name: &str) -> Result<Self, SkillValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SkillValidationError::EmptyName);
        }
        if name.chars().count() > SKILL_NAME_MAX {
            return Err(SkillValidationError::NameTooLong {
                max: SKILL_NAME_MAX,
            });
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(SkillValidationError::NoAlphanumerics);
        }
        Ok(Self {
            id,
            name: name.to_owned(),
            slug,
        })
    }
}

/// Lower-case a name and collapse runs of non-alphanumerics into `-`.
///
/// # Examples
/// ```
/// use mentorship::domain::slugify;
///
/// assert_eq!(slugify("Rust & Systems  Programming"), "rust-systems-programming");
/// assert_eq!(slugify("  C++ "), "c");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Mentor's claimed proficiency in a skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorSkill {
    pub mentor_id: UserId,
    pub skill: Skill,
    pub proficiency: i16,
}

/// Validate a proficiency score.
pub fn validate_proficiency(value: i16) -> Result<i16, SkillValidationError> {
    if PROFICIENCY_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(SkillValidationError::ProficiencyOutOfRange { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Rust", "rust")]
    #[case("Machine Learning", "machine-learning")]
    #[case("--Node.js--", "node-js")]
    fn derives_slugs(#[case] name: &str, #[case] expected: &str) {
        let skill = Skill::new(Uuid::nil(), name).expect("valid skill");
        assert_eq!(skill.slug, expected);
    }

    #[rstest]
    fn rejects_names_without_alphanumerics() {
        assert_eq!(
            Skill::new(Uuid::nil(), "+++"),
            Err(SkillValidationError::NoAlphanumerics)
        );
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(10, true)]
    #[case(11, false)]
    fn proficiency_bounds(#[case] value: i16, #[case] ok: bool) {
        assert_eq!(validate_proficiency(value).is_ok(), ok);
    }
}
