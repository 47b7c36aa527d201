use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    identity::RecordIdentity,
};

/// Field name → token sequence, in the field's original token order.
pub type FieldTokens = BTreeMap<String, Vec<String>>;

/// Field name → punctuation-stripped text.
pub type FieldText = BTreeMap<String, String>;

/// The indexed snapshot of one source record.
///
/// Both mappings are owned by the record, so cloning it yields a fully
/// independent copy. `tokens` and `clean_text` are populated separately
/// and may end up with different key sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    identity: RecordIdentity,
    pub tokens: FieldTokens,
    pub clean_text: FieldText,
}

impl IndexRecord {
    pub fn new(identity: RecordIdentity) -> Self {
        Self {
            identity,
            tokens: FieldTokens::new(),
            clean_text: FieldText::new(),
        }
    }

    pub fn identity(&self) -> &RecordIdentity {
        &self.identity
    }

    /// Encode `tokens` as a JSON object of string arrays.
    ///
    /// Non-ASCII text is written as-is, not `\u` escaped.
    pub fn serialize_tokens(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tokens)?)
    }

    /// Encode `clean_text` as a JSON object of strings.
    pub fn serialize_clean_text(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.clean_text)?)
    }

    /// Replace `tokens` with the decoded contents of `data`.
    ///
    /// On error the current mapping is left untouched.
    pub fn deserialize_tokens(&mut self, data: &str) -> Result<()> {
        self.tokens = decode(data, "keywords")?;
        Ok(())
    }

    /// Replace `clean_text` with the decoded contents of `data`.
    pub fn deserialize_clean_text(&mut self, data: &str) -> Result<()> {
        self.clean_text = decode(data, "clean_data")?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(data: &str, context: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|source| Error::MalformedIndexData {
        context: context.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample() -> IndexRecord {
        let mut record =
            IndexRecord::new(RecordIdentity::new("blog", "Post", "1"));
        record.tokens.insert(
            "title".to_string(),
            vec!["red".into(), "fox".into(), "red".into()],
        );
        record
            .clean_text
            .insert("title".to_string(), "red fox red".to_string());
        record
    }

    #[test]
    fn tokens_roundtrip() {
        let record = sample();
        let encoded = record.serialize_tokens().unwrap();

        let mut restored = IndexRecord::new(record.identity().clone());
        restored.deserialize_tokens(&encoded).unwrap();
        assert_eq!(restored.tokens, record.tokens);
    }

    #[test]
    fn clean_text_roundtrip() {
        let record = sample();
        let encoded = record.serialize_clean_text().unwrap();

        let mut restored = IndexRecord::new(record.identity().clone());
        restored.deserialize_clean_text(&encoded).unwrap();
        assert_eq!(restored.clean_text, record.clean_text);
    }

    #[test]
    fn non_ascii_is_written_literally() {
        let mut record =
            IndexRecord::new(RecordIdentity::new("blog", "Post", "1"));
        record
            .clean_text
            .insert("title".to_string(), "北京欢迎你".to_string());
        record
            .tokens
            .insert("title".to_string(), vec!["北".into(), "京".into()]);

        assert_eq!(
            record.serialize_clean_text().unwrap(),
            r#"{"title":"北京欢迎你"}"#
        );
        assert_eq!(
            record.serialize_tokens().unwrap(),
            r#"{"title":["北","京"]}"#
        );
    }

    #[test]
    fn escaped_slashes_are_accepted() {
        let mut record =
            IndexRecord::new(RecordIdentity::new("blog", "Post", "1"));
        record
            .deserialize_clean_text(r#"{"url":"a\/b"}"#)
            .unwrap();
        assert_eq!(record.clean_text["url"], "a/b");
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let mut record = sample();
        let before = record.clone();

        let err = record.deserialize_tokens(r#"{"title":"red"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedIndexData { .. }));

        let err = record
            .deserialize_clean_text(r#"{"title":["red"]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedIndexData { .. }));

        let err = record.deserialize_tokens("not json").unwrap_err();
        assert!(matches!(err, Error::MalformedIndexData { .. }));

        assert_eq!(record, before);
    }

    #[test]
    fn clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.tokens.get_mut("title").unwrap().push("jumps".into());
        copy.clean_text.clear();

        assert_eq!(original.tokens["title"].len(), 3);
        assert_eq!(original.clean_text.len(), 1);
    }

    proptest! {
        #[test]
        fn mappings_roundtrip(
            tokens in proptest::collection::btree_map(
                ".{0,8}",
                proptest::collection::vec(".{0,8}", 0..5),
                0..4,
            ),
            clean_text in proptest::collection::btree_map(
                ".{0,8}",
                ".{0,16}",
                0..4,
            ),
        ) {
            let mut record =
                IndexRecord::new(RecordIdentity::new("c", "t", "1"));
            record.tokens = tokens;
            record.clean_text = clean_text;

            let mut restored =
                IndexRecord::new(record.identity().clone());
            restored
                .deserialize_tokens(&record.serialize_tokens().unwrap())
                .unwrap();
            restored
                .deserialize_clean_text(
                    &record.serialize_clean_text().unwrap(),
                )
                .unwrap();

            prop_assert_eq!(restored, record);
        }
    }
}
