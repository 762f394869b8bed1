pub(crate) mod support;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::{ClearanceOrder, SessionScope, StorageClearOptions};

#[test]
fn test_scope_labels() {
    assert_eq!(SessionScope::Default.to_string(), "[default]");
    assert_eq!(SessionScope::Webview.to_string(), "[webview]");
}

#[test]
fn test_default_order() {
    assert_eq!(
        ClearanceOrder::default().scopes(),
        [SessionScope::Default, SessionScope::Webview]
    );
}

#[test]
fn test_storage_options_json() {
    assert_eq!(
        StorageClearOptions::all().to_json(),
        json!({
            "origin": "*",
            "quotas": ["temporary", "persistent", "syncable"],
            "storages": [
                "appcache",
                "cookies",
                "filesystem",
                "indexdb",
                "localstorage",
                "shadercache",
                "websql",
                "serviceworkers"
            ]
        })
    );
}
