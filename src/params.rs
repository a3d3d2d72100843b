use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered multimap of string parameters used for query strings and form bodies.
///
/// Duplicate keys are allowed and pairs are encoded in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping any earlier values of the same key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Replaces every value of `key` with a single value.
    ///
    /// The new pair takes the position of the first existing pair for the
    /// key, or is appended when the key is absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter().position(|(name, _)| *name == key) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(name, _)| {
                    let keep = index <= first || *name != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value of `key` in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub(crate) fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Ordered string record serialized as a flat JSON object.
///
/// Keys are unique; inserting an existing key replaces its value in place.
/// An empty record means "no request body".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonParams {
    fields: Vec<(String, String)>,
}

impl JsonParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl Serialize for JsonParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<()> for JsonParams {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K, V> FromIterator<(K, V)> for JsonParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::default();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for JsonParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<K, V> From<Vec<(K, V)>> for JsonParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(fields: Vec<(K, V)>) -> Self {
        fields.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{JsonParams, Params};

    #[test]
    fn add_keeps_duplicates_in_order() {
        let mut params = Params::new();
        params.add("tag", "a").add("page", "1").add("tag", "b");
        assert_eq!(params.get_all("tag").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(params.get("tag"), Some("a"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn set_replaces_all_values_at_first_position() {
        let mut params: Params = [("tag", "a"), ("page", "1"), ("tag", "b")].into();
        params.set("tag", "c");
        assert_eq!(params.iter().collect::<Vec<_>>(), [("tag", "c"), ("page", "1")]);

        params.set("sort", "asc");
        assert_eq!(params.iter().last(), Some(("sort", "asc")));
    }

    #[test]
    fn unit_converts_to_empty() {
        let params: Params = ().into();
        let json: JsonParams = ().into();
        assert!(params.is_empty());
        assert!(json.is_empty());
    }

    #[test]
    fn json_params_replace_in_place() {
        let mut params: JsonParams = [("a", "1"), ("b", "2")].into();
        params.insert("a", "3");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(
            serde_json::to_string(&params).expect("must serialize"),
            r#"{"a":"3","b":"2"}"#
        );
    }
}
