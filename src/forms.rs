//! Request body validation. Each form turns a raw JSON body into typed,
//! checked values or a field-keyed `ApiError::Validation`.
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldErrors};

pub const MAX_PLACE_FIELD_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PHONE_LEN: usize = 15;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_STRING: &str = "Not a valid string.";
const NOT_INTEGER: &str = "A valid integer is required.";

#[derive(Debug, Clone, PartialEq)]
pub struct AddReviewForm {
    pub place_name: String,
    pub address: String,
    pub rating: u8,
    pub review_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// Collects messages per field so every problem is reported at once.
struct Checker<'a> {
    body: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Checker<'a> {
    fn new(body: &'a Value) -> Result<Self, ApiError> {
        match body.as_object() {
            Some(body) => Ok(Self {
                body,
                errors: FieldErrors::new(),
            }),
            None => Err(ApiError::non_field(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type(body)
            ))),
        }
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_default().push(message.into());
    }

    fn present(&mut self, field: &str) -> Option<&'a Value> {
        match self.body.get(field) {
            None => {
                self.fail(field, REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.fail(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Trimmed, non-blank text of at most `max_len` characters.
    fn text(&mut self, field: &str, max_len: Option<usize>) -> Option<String> {
        self.text_in(&[field], max_len)
    }

    // Like `text`, accepting the first of several aliases that is present.
    fn text_in(&mut self, fields: &[&str], max_len: Option<usize>) -> Option<String> {
        let field = fields
            .iter()
            .copied()
            .find(|f| self.body.contains_key(*f))
            .unwrap_or(fields[0]);

        let text = match self.present(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.fail(field, NOT_STRING);
                return None;
            }
        };

        if text.is_empty() {
            self.fail(field, NOT_BLANK);
            return None;
        }
        if let Some(max) = max_len {
            if text.chars().count() > max {
                self.fail(field, format!("Ensure this field has no more than {max} characters."));
                return None;
            }
        }
        Some(text)
    }

    fn integer(&mut self, field: &str, min: i64, max: i64) -> Option<i64> {
        let parsed = match self.present(field)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            }
            _ => None,
        };

        let Some(value) = parsed else {
            self.fail(field, NOT_INTEGER);
            return None;
        };
        if value < min {
            self.fail(field, format!("Ensure this value is greater than or equal to {min}."));
            return None;
        }
        if value > max {
            self.fail(field, format!("Ensure this value is less than or equal to {max}."));
            return None;
        }
        Some(value)
    }

    fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ApiError> {
        if !self.errors.is_empty() {
            return Err(ApiError::Validation(self.errors));
        }
        build().ok_or_else(|| ApiError::non_field("Invalid data."))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

impl AddReviewForm {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let mut check = Checker::new(body)?;
        let place_name = check.text("place_name", Some(MAX_PLACE_FIELD_LEN));
        let address = check.text("address", Some(MAX_PLACE_FIELD_LEN));
        let rating = check.integer("rating", MIN_RATING, MAX_RATING);
        let review_text = check.text("review_text", None);

        check.finish(|| {
            Some(Self {
                place_name: place_name?,
                address: address?,
                rating: u8::try_from(rating?).ok()?,
                review_text: review_text?,
            })
        })
    }
}

impl RegisterForm {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let mut check = Checker::new(body)?;
        let name = check.text("name", Some(MAX_NAME_LEN));
        let phone_number = check.text("phone_number", Some(MAX_PHONE_LEN));
        let password = check.text("password", None);

        check.finish(|| {
            Some(Self {
                name: name?,
                phone_number: phone_number?,
                password: password?,
            })
        })
    }
}

impl LoginForm {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let mut check = Checker::new(body)?;
        let username = check.text_in(&["username", "phone_number"], None);
        let password = check.text("password", None);

        check.finish(|| {
            Some(Self {
                username: username?,
                password: password?,
            })
        })
    }
}
