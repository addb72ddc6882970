use validator::Validate;

/// Field names of `payload` that failed validation, sorted so messages are stable.
pub fn invalid_fields<T: Validate>(payload: &T) -> Vec<String> {
    match payload.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            fields
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::NewCv;

    #[test]
    fn complete_payload_passes() {
        assert!(invalid_fields(&NewCv::new("Alice", "a@x.com", "555-0100")).is_empty());
    }

    #[test]
    fn empty_fields_are_named() {
        let fields = invalid_fields(&NewCv::new("", "a@x.com", ""));
        assert_eq!(fields, vec!["name".to_string(), "phone".to_string()]);
    }
}
