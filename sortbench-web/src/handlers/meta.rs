//! Metadata Service (spec.md §4.12, C12): `GET /meta`.

use std::path::PathBuf;

use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use sortbench_engine::{list_algorithms, Distribution, ElemType};

#[derive(Serialize)]
struct MetaBody {
    types: Vec<&'static str>,
    dists: Vec<&'static str>,
    algos: std::collections::BTreeMap<&'static str, Vec<String>>,
}

/// Repeated `?plugin=path` query parameters extend discovery for this call
/// only; plugin handles never persist across requests on this path, unlike
/// the process-global `PluginLoader` behind `POST /run` and `POST /jobs`.
fn plugin_paths(req: &HttpRequest) -> Vec<PathBuf> {
    req.query_string()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "plugin")
        .filter_map(|(_, value)| urlencoding_decode(value))
        .map(PathBuf::from)
        .collect()
}

/// Minimal percent-decoding for query values; this service has no other use
/// for a full URL-parsing dependency (see DESIGN.md's dropped `url` crate).
fn urlencoding_decode(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(' '),
            b'%' => {
                let hi = bytes.next()?;
                let lo = bytes.next()?;
                let byte = u8::from_str_radix(&format!("{}{}", hi as char, lo as char), 16).ok()?;
                out.push(byte as char);
            }
            _ => out.push(b as char),
        }
    }
    Some(out)
}

pub async fn meta(req: HttpRequest) -> HttpResponse {
    let plugins = plugin_paths(&req);

    let mut algos = std::collections::BTreeMap::new();
    for elem_type in ElemType::ALL {
        algos.insert(elem_type.as_str(), list_algorithms(elem_type, &plugins));
    }

    let body = MetaBody {
        types: ElemType::ALL.iter().map(ElemType::as_str).collect(),
        dists: Distribution::ALL.iter().map(Distribution::as_str).collect(),
        algos,
    };

    HttpResponse::Ok().json(body)
}
