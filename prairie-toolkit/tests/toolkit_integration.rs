//! Toolkit used the way the growth engine uses it: look up by name, call with one value.

use prairie_toolkit::{decompose, dirname, token_replace, Toolkit, ToolkitError};
use serde_json::{json, Value};

#[test_log::test]
fn custom_functions_sit_next_to_defaults() {
    let toolkit = Toolkit::with_defaults().register("shout", |v: &Value| {
        v.as_str()
            .map(|s| json!(format!("{}!", s.to_uppercase())))
            .ok_or_else(|| ToolkitError::invalid_argument("shout", "a string", v))
    });

    assert_eq!(toolkit.call("shout", &json!("tree")).unwrap().unwrap(), json!("TREE!"));
    assert_eq!(toolkit.call("toLower", &json!("TREE")).unwrap().unwrap(), json!("tree"));
    assert!(toolkit.call("shout", &json!(1)).unwrap().is_err());
    assert!(toolkit.call("whisper", &json!("x")).is_none());
}

#[test_log::test]
fn overriding_a_default_replaces_it() {
    let toolkit = Toolkit::with_defaults().register("first", |_: &Value| Ok(json!("override")));
    assert_eq!(toolkit.call("first", &json!([1, 2])).unwrap().unwrap(), json!("override"));
}

#[test_log::test]
fn path_helpers_compose() {
    let record = json!({"path": "one/folder/two/leaf"});
    let record = record.as_object().unwrap();
    let dir = dirname(record["path"].as_str().unwrap());
    let fields = decompose(&dir);
    assert_eq!(fields["dirsplit"], json!(["one", "folder", "two"]));

    let mut grown = record.clone();
    grown.extend(fields);
    assert_eq!(token_replace("{dir1}/{dir3}", &grown), "one/two");
}
