use cmtree_core::schema::ParameterMeta;
use cmtree_core::{ConfigTree, DistName, ManagedObject, OperationTag, StaticCatalog};

/// ROOT > A > B, plus C under ROOT whose ids must be multiples of 2
#[allow(dead_code)]
pub fn fixture_catalog() -> StaticCatalog {
    StaticCatalog::new("ROOT")
        .with_default_version("1.0")
        .with_class("ROOT", ["A", "C"])
        .with_class("A", ["B"])
        .with_class("B", Vec::<String>::new())
        .with_class("C", Vec::<String>::new())
        .with_param("B", "x", int_param(false, None))
        .with_param("B", "level", int_param(false, Some("0...100, step 1")))
        .with_param("B", "name", ParameterMeta::default())
        .with_param("B", "tags", list_param(&["val"]))
        .with_param("B", "bands", list_param(&["lo", "hi"]))
        .with_param("C", "cId", int_param(false, Some("1...10, step 2")))
}

/// Same tree shape as [`fixture_catalog`] but C accepts every id in range
#[allow(dead_code)]
pub fn permissive_catalog() -> StaticCatalog {
    fixture_catalog().with_param("C", "cId", int_param(false, Some("1...10, step 1")))
}

#[allow(dead_code)]
pub fn int_param(required: bool, range: Option<&str>) -> ParameterMeta {
    ParameterMeta {
        kind: "int".into(),
        required,
        range: range.map(str::to_string),
        ..ParameterMeta::default()
    }
}

#[allow(dead_code)]
pub fn list_param(fields: &[&str]) -> ParameterMeta {
    ParameterMeta {
        kind: "list".into(),
        children: fields.iter().map(|f| f.to_string()).collect(),
        ..ParameterMeta::default()
    }
}

#[allow(dead_code)]
pub fn dn(path: &str) -> DistName {
    DistName::parse(path).expect("Should parse fixture distName")
}

/// ROOT-1/A-1/B-1 with x=10, as a baseline would load it
#[allow(dead_code)]
pub fn baseline_tree() -> ConfigTree {
    let object = |class: &str, path: &str| {
        ManagedObject::new(class, None, dn(path), "1.0").with_operation(OperationTag::Create)
    };
    let mut b = object("B", "ROOT-1/A-1/B-1");
    b.set_parameter("x", "10");
    ConfigTree::from_objects([object("ROOT", "ROOT-1"), object("A", "ROOT-1/A-1"), b])
        .expect("Should build baseline tree")
}
