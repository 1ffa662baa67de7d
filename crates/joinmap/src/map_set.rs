//! Validated sets of mapping definitions.
//!
//! A [`MapSet`] owns every definition a mapping call may reach, keyed by
//! mapId. Construction normalizes and checks the whole configuration once:
//! duplicate mapIds, references to undefined maps, clashing field names and
//! reference cycles are all reported as [`ConfigError`]s before any row is
//! mapped. Afterwards the set is immutable and can be shared across threads.

use crate::config::ResultMapConfig;
use crate::map::{Factory, ResultMap};
use crate::materialize::{map_collection, map_single};
use indexmap::IndexMap;
use joinmap_core::{ConfigError, ConfigErrorKind, Error, Record, Result, Row};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An immutable, validated set of mapping definitions.
///
/// # Example
///
/// ```
/// use joinmap::{MapSet, ResultMap};
///
/// let maps = MapSet::builder()
///     .map(ResultMap::new("team").property("name").collection("heroes", "hero", "hero_"))
///     .map(ResultMap::new("hero").property("name"))
///     .build()
///     .unwrap();
///
/// assert_eq!(maps.len(), 2);
/// assert!(maps.get("hero").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSet {
    maps: IndexMap<String, ResultMap>,
}

/// Collects definitions for a [`MapSet`].
#[derive(Debug, Default)]
pub struct MapSetBuilder {
    maps: Vec<ResultMap>,
}

impl MapSetBuilder {
    /// Add a definition.
    #[must_use]
    pub fn map(mut self, map: ResultMap) -> Self {
        self.maps.push(map);
        self
    }

    /// Validate and build the set.
    pub fn build(self) -> Result<MapSet> {
        MapSet::new(self.maps)
    }
}

impl MapSet {
    pub fn builder() -> MapSetBuilder {
        MapSetBuilder::default()
    }

    /// Build a set from canonical definitions.
    #[tracing::instrument(level = "debug", skip(maps))]
    pub fn new(maps: impl IntoIterator<Item = ResultMap>) -> Result<Self> {
        let mut by_id = IndexMap::new();
        for map in maps {
            if by_id.contains_key(map.map_id()) {
                return Err(ConfigError::new(
                    ConfigErrorKind::DuplicateMap,
                    format!("mapId '{}' is defined more than once", map.map_id()),
                )
                .on_map(map.map_id())
                .into());
            }
            by_id.insert(map.map_id().to_string(), map);
        }

        let set = Self { maps: by_id };
        set.validate()?;
        tracing::debug!(maps = set.maps.len(), "Loaded mapping definitions");
        Ok(set)
    }

    /// Build a set from raw configuration entries.
    pub fn from_config(configs: impl IntoIterator<Item = ResultMapConfig>) -> Result<Self> {
        Self::new(configs.into_iter().map(ResultMap::from_config))
    }

    /// Parse a JSON array of definitions.
    ///
    /// # Example
    ///
    /// ```
    /// use joinmap::MapSet;
    ///
    /// let maps = MapSet::from_json(r#"[
    ///     {"mapId": "hero", "properties": ["name"],
    ///      "associations": [{"name": "team", "mapId": "team", "columnPrefix": "team_"}]},
    ///     {"mapId": "team", "properties": ["name"]}
    /// ]"#).unwrap();
    ///
    /// assert_eq!(maps.map_ids().collect::<Vec<_>>(), vec!["hero", "team"]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<ResultMapConfig> = serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError::new(
                ConfigErrorKind::Parse,
                format!("invalid mapping document: {e}"),
            ))
        })?;
        Self::from_config(configs)
    }

    /// Attach a record factory to a loaded definition.
    pub fn set_factory<F>(&mut self, map_id: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Record + Send + Sync + 'static,
    {
        let map = self.maps.get_mut(map_id).ok_or_else(|| unknown_map(map_id))?;
        let factory: Factory = Arc::new(factory);
        map.set_factory(factory);
        Ok(())
    }

    pub fn get(&self, map_id: &str) -> Option<&ResultMap> {
        self.maps.get(map_id)
    }

    /// Look up a definition, failing with `UnknownMap`.
    pub fn require(&self, map_id: &str) -> Result<&ResultMap> {
        self.get(map_id).ok_or_else(|| unknown_map(map_id))
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// MapIds in load order.
    pub fn map_ids(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultMap> {
        self.maps.values()
    }

    /// See [`map_collection`].
    pub fn map_collection(
        &self,
        rows: &[Row],
        map_id: &str,
        column_prefix: &str,
    ) -> Result<Vec<Record>> {
        map_collection(rows, self, map_id, column_prefix)
    }

    /// See [`map_single`].
    pub fn map_single(
        &self,
        rows: &[Row],
        map_id: &str,
        column_prefix: &str,
        required: bool,
    ) -> Result<Option<Record>> {
        map_single(rows, self, map_id, column_prefix, required)
    }

    fn validate(&self) -> Result<()> {
        for map in self.maps.values() {
            check_fields(map)?;
            for relation in map.relations() {
                if !self.maps.contains_key(&relation.map_id) {
                    return Err(ConfigError::new(
                        ConfigErrorKind::UnknownMap,
                        format!(
                            "field '{}' references unknown mapId '{}'",
                            relation.name, relation.map_id
                        ),
                    )
                    .on_map(map.map_id())
                    .into());
                }
            }
        }
        self.check_acyclic()
    }

    /// Depth-first search over association/collection edges.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit<'a>(
            set: &'a MapSet,
            map_id: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(map_id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    let start = path.iter().position(|id| *id == map_id).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[start..].to_vec();
                    cycle.push(map_id);
                    return Err(ConfigError::new(
                        ConfigErrorKind::Cycle,
                        format!("mapping cycle: {}", cycle.join(" -> ")),
                    )
                    .on_map(map_id)
                    .into());
                }
                None => {}
            }

            marks.insert(map_id, Mark::InProgress);
            path.push(map_id);
            if let Some(map) = set.maps.get(map_id) {
                for relation in map.relations() {
                    visit(set, &relation.map_id, marks, path)?;
                }
            }
            path.pop();
            marks.insert(map_id, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for map_id in self.maps.keys() {
            visit(self, map_id, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

fn unknown_map(map_id: &str) -> Error {
    ConfigError::new(
        ConfigErrorKind::UnknownMap,
        format!("unknown mapId '{map_id}'"),
    )
    .on_map(map_id)
    .into()
}

/// Reject empty identities and relation fields that collide with each other
/// or with declared scalar fields.
fn check_fields(map: &ResultMap) -> Result<()> {
    if map.identity().is_empty() {
        return Err(ConfigError::new(
            ConfigErrorKind::EmptyIdProperty,
            "idProperty must name at least one column",
        )
        .on_map(map.map_id())
        .into());
    }

    let scalars: HashSet<&str> = map
        .identity()
        .iter()
        .chain(map.explicit_properties().unwrap_or_default())
        .map(|p| p.name.as_str())
        .collect();

    let mut relations = HashSet::new();
    for relation in map.relations() {
        if scalars.contains(relation.name.as_str()) {
            return Err(ConfigError::new(
                ConfigErrorKind::FieldConflict,
                format!(
                    "field '{}' is both a scalar property and a relation",
                    relation.name
                ),
            )
            .on_map(map.map_id())
            .into());
        }
        if !relations.insert(relation.name.as_str()) {
            return Err(ConfigError::new(
                ConfigErrorKind::FieldConflict,
                format!("relation field '{}' is declared twice", relation.name),
            )
            .on_map(map.map_id())
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(result: Result<MapSet>) -> ConfigErrorKind {
        match result {
            Err(Error::Config(e)) => e.kind,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_map_ids() {
        let result = MapSet::new([ResultMap::new("hero"), ResultMap::new("hero")]);
        assert_eq!(kind(result), ConfigErrorKind::DuplicateMap);
    }

    #[test]
    fn test_rejects_unknown_references() {
        let result = MapSet::new([ResultMap::new("hero").association("team", "team", "team_")]);
        assert_eq!(kind(result), ConfigErrorKind::UnknownMap);
    }

    #[test]
    fn test_rejects_cycles() {
        let result = MapSet::new([
            ResultMap::new("team").collection("heroes", "hero", "hero_"),
            ResultMap::new("hero").association("team", "team", "team_"),
        ]);
        match result {
            Err(Error::Config(e)) => {
                assert_eq!(e.kind, ConfigErrorKind::Cycle);
                assert!(e.message.contains("team -> hero -> team"), "{}", e.message);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_self_reference() {
        let result = MapSet::new([ResultMap::new("node").collection("children", "node", "child_")]);
        assert_eq!(kind(result), ConfigErrorKind::Cycle);
    }

    #[test]
    fn test_accepts_shared_targets() {
        // Two paths to the same definition are not a cycle.
        let result = MapSet::new([
            ResultMap::new("hero")
                .association("team", "team", "team_")
                .association("rival_team", "team", "rival_"),
            ResultMap::new("team"),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_field_conflicts() {
        let scalar_clash = MapSet::new([
            ResultMap::new("hero")
                .property("team")
                .association("team", "team", "team_"),
            ResultMap::new("team"),
        ]);
        assert_eq!(kind(scalar_clash), ConfigErrorKind::FieldConflict);

        let relation_clash = MapSet::new([
            ResultMap::new("hero")
                .association("team", "team", "team_")
                .collection("team", "team", "teams_"),
            ResultMap::new("team"),
        ]);
        assert_eq!(kind(relation_clash), ConfigErrorKind::FieldConflict);
    }

    #[test]
    fn test_rejects_empty_identity() {
        let result = MapSet::from_json(r#"[{"mapId": "hero", "idProperty": []}]"#);
        assert_eq!(kind(result), ConfigErrorKind::EmptyIdProperty);
    }

    #[test]
    fn test_reports_parse_errors() {
        assert_eq!(kind(MapSet::from_json("{not json")), ConfigErrorKind::Parse);
        assert_eq!(
            kind(MapSet::from_json(r#"[{"idProperty": "id"}]"#)),
            ConfigErrorKind::Parse
        );
    }

    #[test]
    fn test_set_factory_on_loaded_map() {
        let mut maps = MapSet::from_json(r#"[{"mapId": "hero"}]"#).unwrap();
        maps.set_factory("hero", || Record::new().with("kind", "hero")).unwrap();
        assert_eq!(maps.require("hero").unwrap().create().len(), 1);

        let err = maps.set_factory("villain", Record::new).unwrap_err();
        assert_eq!(err.config_kind(), Some(ConfigErrorKind::UnknownMap));
    }
}
