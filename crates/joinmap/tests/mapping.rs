use joinmap::prelude::*;
use joinmap::ConfigErrorKind;
use serde::Deserialize;

fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
}

fn text(s: &str) -> Value {
    Value::from(s)
}

fn parent_child_maps() -> MapSet {
    MapSet::builder()
        .map(
            ResultMap::new("parent")
                .property("name")
                .collection("children", "child", "child_"),
        )
        .map(ResultMap::new("child").property("name"))
        .build()
        .unwrap()
}

fn parent_child_rows() -> Vec<Row> {
    vec![
        row(&[
            ("id", Value::Int(1)),
            ("name", text("A")),
            ("child_id", Value::Int(10)),
            ("child_name", text("X")),
        ]),
        row(&[
            ("id", Value::Int(1)),
            ("name", text("A")),
            ("child_id", Value::Int(11)),
            ("child_name", text("Y")),
        ]),
        row(&[
            ("id", Value::Int(2)),
            ("name", text("B")),
            ("child_id", Value::Null),
            ("child_name", Value::Null),
        ]),
    ]
}

#[test]
fn folds_parent_child_join() {
    let maps = parent_child_maps();
    let parents = map_collection(&parent_child_rows(), &maps, "parent", "").unwrap();

    assert_eq!(
        serde_json::to_value(&parents).unwrap(),
        serde_json::json!([
            {"id": 1, "name": "A", "children": [
                {"id": 10, "name": "X"},
                {"id": 11, "name": "Y"}
            ]},
            {"id": 2, "name": "B", "children": []}
        ])
    );
}

#[test]
fn collection_members_are_unique_and_ordered() {
    let maps = parent_child_maps();
    let mut rows = parent_child_rows();
    // Repeat the first child after the second one.
    rows.push(row(&[
        ("id", Value::Int(1)),
        ("name", text("A")),
        ("child_id", Value::Int(10)),
        ("child_name", text("X again")),
    ]));

    let parents = map_collection(&rows, &maps, "parent", "").unwrap();
    let children = parents[0].list("children").unwrap();
    let ids: Vec<_> = children.iter().map(|c| c.value("id").cloned()).collect();
    assert_eq!(ids, vec![Some(Value::Int(10)), Some(Value::Int(11))]);
    assert_eq!(children[0].value("name"), Some(&text("X")));
}

#[test]
fn top_level_order_follows_first_occurrence() {
    let maps = parent_child_maps();
    let rows = vec![
        row(&[("id", Value::Int(3)), ("name", text("C"))]),
        row(&[("id", Value::Int(1)), ("name", text("A"))]),
        row(&[("id", Value::Int(3)), ("name", text("C"))]),
        row(&[("id", Value::Int(2)), ("name", text("B"))]),
    ];

    let parents = map_collection(&rows, &maps, "parent", "").unwrap();
    let ids: Vec<i64> = parents.iter().map(|p| p.get_as("id").unwrap()).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[test]
fn rows_with_null_root_identity_are_skipped() {
    let maps = parent_child_maps();
    let rows = vec![
        row(&[("id", Value::Null), ("name", text("ghost"))]),
        row(&[("id", Value::Int(1)), ("name", text("A"))]),
    ];

    let parents = map_collection(&rows, &maps, "parent", "").unwrap();
    assert_eq!(parents.len(), 1);

    let only_nulls = vec![row(&[("id", Value::Null)])];
    assert!(map_collection(&only_nulls, &maps, "parent", "").unwrap().is_empty());
    assert!(
        map_single(&only_nulls, &maps, "parent", "", true)
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn mapping_is_idempotent() {
    let maps = parent_child_maps();
    let rows = parent_child_rows();

    let first = map_collection(&rows, &maps, "parent", "").unwrap();
    let second = map_collection(&rows, &maps, "parent", "").unwrap();
    assert_eq!(first, second);
}

#[test]
fn map_single_semantics() {
    let maps = parent_child_maps();
    let rows = parent_child_rows();

    let first = map_single(&rows, &maps, "parent", "", true).unwrap().unwrap();
    assert_eq!(first.value("name"), Some(&text("A")));
    assert_eq!(first.list("children").map(<[Record]>::len), Some(2));

    let err = map_single(&[], &maps, "parent", "", true).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "EmptyResponse");

    assert_eq!(map_single(&[], &maps, "parent", "", false).unwrap(), None);

    let err = Mapper::new(&maps, "parent")
        .not_found_message("parent not found")
        .single(&[])
        .unwrap_err();
    assert_eq!(err.to_string(), "parent not found");
}

#[test]
fn association_inside_collection() {
    let maps = MapSet::builder()
        .map(
            ResultMap::new("team")
                .property("name")
                .collection("heroes", "hero", "hero_"),
        )
        .map(
            ResultMap::new("hero")
                .property("name")
                .association("power", "power", "power_"),
        )
        .map(ResultMap::new("power").property("name"))
        .build()
        .unwrap();

    let rows = vec![
        row(&[
            ("id", Value::Int(1)),
            ("name", text("Avengers")),
            ("hero_id", Value::Int(10)),
            ("hero_name", text("Thor")),
            ("power_id", Value::Int(100)),
            ("power_name", text("Lightning")),
        ]),
        row(&[
            ("id", Value::Int(1)),
            ("name", text("Avengers")),
            ("hero_id", Value::Int(11)),
            ("hero_name", text("Hawkeye")),
            ("power_id", Value::Null),
            ("power_name", Value::Null),
        ]),
    ];

    let teams = map_collection(&rows, &maps, "team", "").unwrap();
    assert_eq!(
        teams[0].to_json(),
        serde_json::json!({
            "id": 1,
            "name": "Avengers",
            "heroes": [
                {"id": 10, "name": "Thor", "power": {"id": 100, "name": "Lightning"}},
                {"id": 11, "name": "Hawkeye", "power": null}
            ]
        })
    );
}

#[test]
fn nested_collections_accumulate_across_rows() {
    let maps = MapSet::builder()
        .map(ResultMap::new("author").property("name").collection("books", "book", "b_"))
        .map(ResultMap::new("book").property("title").collection("tags", "tag", "t_"))
        .map(ResultMap::new("tag").property("label"))
        .build()
        .unwrap();

    let mk = |book: i32, title: &str, tag: i32, label: &str| {
        row(&[
            ("id", Value::Int(1)),
            ("name", text("Le Guin")),
            ("b_id", Value::Int(book)),
            ("b_title", text(title)),
            ("t_id", Value::Int(tag)),
            ("t_label", text(label)),
        ])
    };
    let rows = vec![
        mk(1, "Earthsea", 1, "fantasy"),
        mk(1, "Earthsea", 2, "classic"),
        mk(2, "Dispossessed", 3, "sf"),
        mk(2, "Dispossessed", 2, "classic"),
    ];

    let authors = map_collection(&rows, &maps, "author", "").unwrap();
    assert_eq!(authors.len(), 1);
    let books = authors[0].list("books").unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].list("tags").unwrap().len(), 2);
    assert_eq!(books[1].list("tags").unwrap().len(), 2);
    assert_eq!(books[1].list("tags").unwrap()[1].value("label"), Some(&text("classic")));
}

#[test]
fn composite_identity_keys() {
    let maps = MapSet::builder()
        .map(
            ResultMap::new("membership")
                .id_property(["team_id", "hero_id"])
                .property("role"),
        )
        .build()
        .unwrap();

    let rows = vec![
        row(&[("team_id", Value::Int(1)), ("hero_id", Value::Int(10)), ("role", text("lead"))]),
        row(&[("team_id", Value::Int(1)), ("hero_id", Value::Int(11)), ("role", text("scout"))]),
        row(&[("team_id", Value::Int(1)), ("hero_id", Value::Int(10)), ("role", text("other"))]),
        row(&[("team_id", Value::Null), ("hero_id", Value::Int(12)), ("role", text("none"))]),
    ];

    let memberships = map_collection(&rows, &maps, "membership", "").unwrap();
    assert_eq!(memberships.len(), 2);
    assert_eq!(memberships[0].value("role"), Some(&text("lead")));
    assert_eq!(memberships[0].value("team_id"), Some(&Value::Int(1)));
}

#[test]
fn renamed_identity_and_properties() {
    let maps = MapSet::builder()
        .map(
            ResultMap::new("team")
                .id_property(("id", "team_id"))
                .property(("city", "hq_city")),
        )
        .build()
        .unwrap();

    let rows = vec![row(&[("t_team_id", Value::Int(7)), ("t_hq_city", text("NYC"))])];
    let teams = map_collection(&rows, &maps, "team", "t_").unwrap();

    assert_eq!(teams[0].value("id"), Some(&Value::Int(7)));
    assert_eq!(teams[0].value("city"), Some(&text("NYC")));
    assert!(!teams[0].contains("team_id"));
}

#[test]
fn missing_columns_read_as_null() {
    let maps = MapSet::builder()
        .map(ResultMap::new("hero").properties(["name", "age"]))
        .build()
        .unwrap();

    let heroes = map_collection(&[row(&[("id", Value::Int(1))])], &maps, "hero", "").unwrap();
    assert_eq!(heroes[0].value("name"), Some(&Value::Null));
    assert_eq!(heroes[0].get_as::<Option<i64>>("age").unwrap(), None);
}

#[test]
fn inferred_properties_for_nested_entities() {
    let maps = MapSet::builder()
        .map(ResultMap::new("parent").collection("children", "child", "child_"))
        .map(ResultMap::new("child"))
        .build()
        .unwrap();

    let parents = map_collection(&parent_child_rows(), &maps, "parent", "").unwrap();
    let child = &parents[0].list("children").unwrap()[0];
    assert_eq!(child.len(), 2);
    assert_eq!(child.value("name"), Some(&text("X")));

    // Root inference sees every column, including the prefixed ones.
    assert!(parents[0].contains("child_name"));
}

#[test]
fn factory_seeds_new_objects() {
    let mut maps = parent_child_maps();
    maps.set_factory("child", || Record::new().with("kind", "child"))
        .unwrap();

    let parents = map_collection(&parent_child_rows(), &maps, "parent", "").unwrap();
    let children = parents[0].list("children").unwrap();
    assert!(children.iter().all(|c| c.value("kind") == Some(&text("child"))));
}

#[test]
fn seeded_field_is_not_overwritten() {
    let maps = MapSet::builder()
        .map(
            ResultMap::new("hero")
                .property("name")
                .create_new(|| Record::new().with("name", "unknown")),
        )
        .build()
        .unwrap();

    let rows = vec![row(&[("id", Value::Int(1)), ("name", text("Thor"))])];
    let heroes = map_collection(&rows, &maps, "hero", "").unwrap();
    assert_eq!(heroes[0].value("name"), Some(&text("unknown")));
}

#[test]
fn root_column_prefix() {
    let maps = parent_child_maps();
    let rows = vec![row(&[
        ("p_id", Value::Int(5)),
        ("p_name", text("E")),
        ("child_id", Value::Int(50)),
        ("child_name", text("Z")),
    ])];

    let parents = maps.map_collection(&rows, "parent", "p_").unwrap();
    assert_eq!(parents[0].value("id"), Some(&Value::Int(5)));
    // Nested prefixes are absolute, not composed with the parent's.
    assert_eq!(parents[0].list("children").unwrap().len(), 1);
}

#[test]
fn unknown_root_map_fails() {
    let maps = parent_child_maps();
    let err = maps.map_collection(&parent_child_rows(), "villain", "").unwrap_err();
    assert_eq!(err.config_kind(), Some(ConfigErrorKind::UnknownMap));
}

#[test]
fn deserialize_into_typed_graph() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Child {
        id: i64,
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Parent {
        id: i64,
        name: String,
        children: Vec<Child>,
    }

    let maps = parent_child_maps();
    let parents: Vec<Parent> = map_collection(&parent_child_rows(), &maps, "parent", "")
        .unwrap()
        .iter()
        .map(|r| r.deserialize_into().unwrap())
        .collect();

    assert_eq!(
        parents[0],
        Parent {
            id: 1,
            name: "A".to_string(),
            children: vec![
                Child { id: 10, name: "X".to_string() },
                Child { id: 11, name: "Y".to_string() },
            ],
        }
    );
    assert!(parents[1].children.is_empty());
}

#[test]
fn filled_association_is_kept_and_its_collections_grow() {
    let maps = MapSet::builder()
        .map(
            ResultMap::new("hero")
                .property("name")
                .association("team", "team", "team_"),
        )
        .map(
            ResultMap::new("team")
                .property("name")
                .collection("members", "member", "m_"),
        )
        .map(ResultMap::new("member").property("name"))
        .build()
        .unwrap();

    let hero_row = |team_id: Value, team_name: Value, member: i32, member_name: &str| {
        row(&[
            ("id", Value::Int(1)),
            ("name", text("T")),
            ("team_id", team_id),
            ("team_name", team_name),
            ("m_id", Value::Int(member)),
            ("m_name", text(member_name)),
        ])
    };
    let rows = vec![
        hero_row(Value::Int(7), text("A"), 1, "x"),
        hero_row(Value::Int(8), text("B"), 2, "y"),
        hero_row(Value::Null, Value::Null, 3, "z"),
    ];

    let heroes = map_collection(&rows, &maps, "hero", "").unwrap();
    assert_eq!(heroes.len(), 1);

    let team = heroes[0].object("team").unwrap();
    assert_eq!(team.value("id"), Some(&Value::Int(7)));
    assert_eq!(team.value("name"), Some(&text("A")));

    let members: Vec<_> = team
        .list("members")
        .unwrap()
        .iter()
        .map(|m| m.value("name").cloned())
        .collect();
    assert_eq!(members, vec![Some(text("x")), Some(text("y")), Some(text("z"))]);
}

#[test]
fn json_null_identity_is_a_missing_join() {
    let maps = MapSet::builder()
        .map(ResultMap::new("hero").association("profile", "profile", "p_"))
        .map(ResultMap::new("profile").property("bio"))
        .build()
        .unwrap();

    let rows = vec![row(&[
        ("id", Value::Int(1)),
        ("p_id", Value::Json(serde_json::Value::Null)),
        ("p_bio", Value::Null),
    ])];

    let heroes = map_collection(&rows, &maps, "hero", "").unwrap();
    assert!(heroes[0].get("profile").unwrap().is_null());
}
