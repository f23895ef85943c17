//! Field mapping between CKAN records and data package descriptors.
//!
//! These are pure reshaping functions: fields the mapping doesn't know
//! about are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Facets requested when the caller doesn't name any.
pub const DEFAULT_FACET_FIELDS: &[&str] = &["organization", "groups", "tags", "res_format", "license_id"];

/// A catalog search in data package vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text. Tokens of the form `field:value` are treated as filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Extra filter query appended to any filters lifted out of `q`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fq: Option<String>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Offset of the first result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    /// Comma separated `field:direction` terms, e.g. `score:desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, rename = "facet.field", skip_serializing_if = "Option::is_none")]
    pub facet_fields: Option<Vec<String>>,
}

/// Parameters of a CKAN `package_search` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CkanSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(rename = "facet.field")]
    pub facet_fields: Vec<String>,
    #[serde(rename = "facet.limit")]
    pub facet_limit: u32,
    #[serde(rename = "facet.mincount")]
    pub facet_mincount: u32,
}

/// A group or organization in the collection shape the UI consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub image: Option<String>,
    pub count: u64,
    #[serde(default)]
    pub extras: Vec<Value>,
    #[serde(default)]
    pub groups: Vec<Value>,
}

/// Translate a search query into CKAN `package_search` parameters.
pub fn to_ckan_search_params(query: &SearchQuery) -> CkanSearchParams {
    let mut q = Vec::new();
    let mut fq = Vec::new();

    if let Some(text) = &query.q {
        for token in split_query(text) {
            if token.contains(':') {
                fq.push(token);
            } else {
                q.push(token);
            }
        }
    }
    if let Some(extra) = query.fq.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        fq.push(extra.to_string());
    }

    let sort = query.sort.as_deref().map(|sort| {
        sort.split(',')
            .map(|term| term.trim().replacen(':', " ", 1))
            .filter(|term| !term.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    });

    CkanSearchParams {
        q: non_empty(q.join(" ")),
        fq: non_empty(fq.join(" ")),
        rows: query.size.filter(|n| *n > 0),
        start: query.from.filter(|n| *n > 0),
        sort: sort.and_then(non_empty),
        facet_fields: query
            .facet_fields
            .clone()
            .unwrap_or_else(|| DEFAULT_FACET_FIELDS.iter().map(|f| f.to_string()).collect()),
        facet_limit: 5,
        facet_mincount: 0,
    }
}

/// Split on whitespace, keeping double-quoted phrases together.
fn split_query(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// JavaScript-style truthiness: null, false, 0, "" are empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Remove `key` and return its value if it carries anything.
fn take_truthy(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(is_truthy)
}

fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = take_truthy(map, from) {
        map.insert(to.to_string(), value);
    }
}

/// Move several keys into a fresh object under new names.
fn gather(map: &mut Map<String, Value>, keys: &[(&str, &str)]) -> Map<String, Value> {
    let mut out = Map::new();
    for (from, to) in keys {
        if let Some(value) = take_truthy(map, from) {
            out.insert(to.to_string(), value);
        }
    }
    out
}

/// Convert a CKAN package into a data package descriptor.
pub fn ckan_to_data_package(package: &Value) -> Value {
    let mut dp = match package {
        Value::Object(map) => map.clone(),
        other => return other.clone(),
    };

    if let Some(Value::String(name)) = dp.get_mut("name") {
        *name = name.to_lowercase();
    }

    rename(&mut dp, "notes", "description");
    rename(&mut dp, "ckan_url", "homepage");

    let license = gather(
        &mut dp,
        &[("license_id", "type"), ("license_title", "title"), ("license_url", "url")],
    );
    if !license.is_empty() {
        dp.insert("license".into(), Value::Object(license));
    }

    // CKAN's author is where the data came from; its maintainer is who
    // looks after the package.
    let source = gather(
        &mut dp,
        &[("author", "name"), ("author_email", "email"), ("url", "web")],
    );
    if !source.is_empty() {
        dp.insert("sources".into(), json!([source]));
    }

    let author = gather(&mut dp, &[("maintainer", "name"), ("maintainer_email", "email")]);
    if !author.is_empty() {
        dp.insert("author".into(), Value::Object(author));
    }

    if let Some(tags) = dp.remove("tags") {
        let keywords: Vec<Value> = tags
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get("name").cloned())
                    .collect()
            })
            .unwrap_or_default();
        dp.insert("keywords".into(), Value::Array(keywords));
    }

    let resources = match dp.remove("resources") {
        Some(Value::Array(resources)) => resources.iter().map(ckan_to_resource).collect(),
        _ => Vec::new(),
    };
    dp.insert("resources".into(), Value::Array(resources));

    Value::Object(dp)
}

fn ckan_to_resource(resource: &Value) -> Value {
    let mut res = match resource {
        Value::Object(map) => map.clone(),
        other => return other.clone(),
    };

    let name = res
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    match name {
        Some(name) => {
            if !res.get("title").map_or(false, is_truthy) {
                res.insert("title".into(), Value::String(name.clone()));
            }
            res.insert("name".into(), Value::String(name.to_lowercase().replace(' ', "_")));
        }
        None => {
            let id = res.get("id").cloned().unwrap_or(Value::Null);
            res.insert("name".into(), id);
        }
    }

    rename(&mut res, "url", "path");

    if let Some(Value::String(format)) = res.get_mut("format") {
        *format = format.to_lowercase();
    }

    Value::Object(res)
}

/// Convert a CKAN resource view into a data package view.
pub fn ckan_view_to_data_package_view(view: &Value) -> Value {
    let mut dpv = match view {
        Value::Object(map) => map.clone(),
        other => return other.clone(),
    };

    let spec_type = match dpv.get("view_type").and_then(Value::as_str) {
        Some("recline_view") | Some("datatables_view") => "table",
        Some("image_view") | Some("webpage_view") => "web",
        _ => "unsupported",
    };
    dpv.insert("specType".into(), Value::String(spec_type.into()));

    match spec_type {
        "table" => {
            dpv.insert("spec".into(), json!({}));
        }
        "web" => {
            if !dpv.get("page_url").map_or(false, is_truthy) {
                let image_url = dpv.get("image_url").cloned().unwrap_or(Value::Null);
                dpv.insert("page_url".into(), image_url);
            }
        }
        _ => {}
    }

    Value::Object(dpv)
}

/// Convert a CKAN group or organization into a [`Collection`].
pub fn to_standard_collection(descriptor: &Value) -> Collection {
    let text = |key: &str| {
        descriptor
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let list = |key: &str| {
        descriptor
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    Collection {
        name: text("name").unwrap_or_default(),
        title: text("title").or_else(|| text("display_name")).unwrap_or_default(),
        summary: text("description").unwrap_or_default(),
        image: text("image_display_url").or_else(|| text("image_url")),
        count: descriptor
            .get("package_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        extras: list("extras"),
        groups: list("groups"),
    }
}
