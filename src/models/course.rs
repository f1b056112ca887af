use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A course as listed in the catalog and selected into a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub course_name: String,
    /// Whole currency units.
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub course_type: CourseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Instructor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Course {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            course_name: name.into(),
            price,
            course_type: CourseType::Paid,
            instructor: None,
            thumbnail: None,
        }
    }

    pub fn free(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            course_type: CourseType::Free,
            ..Self::new(id, name, Decimal::ZERO)
        }
    }

    pub fn is_free(&self) -> bool {
        self.course_type == CourseType::Free
    }

    /// What the course contributes to a cart total; free courses count as zero
    /// whatever price they carry.
    pub fn payable_price(&self) -> Decimal {
        if self.is_free() {
            Decimal::ZERO
        } else {
            self.price
        }
    }
}

/// Only `Free` is meaningful to pricing; every other label is a paid course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseType {
    Free,
    #[default]
    Paid,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Splits a selection into (paid, free) course ids, preserving order.
pub fn partition_ids(courses: &[Course]) -> (Vec<String>, Vec<String>) {
    let (free, paid): (Vec<&Course>, Vec<&Course>) = courses.iter().partition(|c| c.is_free());
    (
        paid.into_iter().map(|c| c.id.clone()).collect(),
        free.into_iter().map(|c| c.id.clone()).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "_id": "c1",
            "courseName": "Rust for Web",
            "price": 1499,
            "courseType": "Free",
            "instructor": { "firstName": "Ada", "lastName": "L" },
            "thumbnail": "https://cdn.example.com/c1.png"
        }"#;

        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.price, dec!(1499));
        assert!(course.is_free());
        assert_eq!(course.payable_price(), Decimal::ZERO);
    }

    #[test]
    fn unknown_course_type_counts_as_paid() {
        let json = r#"{ "_id": "c2", "courseName": "X", "price": 300, "courseType": "Premium" }"#;
        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.course_type, CourseType::Other("Premium".into()));
        assert_eq!(course.payable_price(), dec!(300));
    }

    #[test]
    fn partition_keeps_selection_order() {
        let courses = vec![
            Course::new("a", "A", dec!(100)),
            Course::free("b", "B"),
            Course::new("c", "C", dec!(200)),
        ];
        let (paid, free) = partition_ids(&courses);
        assert_eq!(paid, vec!["a", "c"]);
        assert_eq!(free, vec!["b"]);
    }
}
