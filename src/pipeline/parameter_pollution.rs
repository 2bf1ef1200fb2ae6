use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::web;
use actix_web_lab::middleware::Next;
use std::collections::BTreeMap;

use crate::configuration::SecuritySettings;
use crate::pipeline::query::{parse_query, rewrite_query};
use crate::pipeline::{QueryValue, RequestContext};

/// Outcome of collapsing repeated query parameters.
#[derive(Debug, PartialEq, Eq)]
pub struct CollapsedQuery {
    pub values: BTreeMap<String, QueryValue>,
    /// Pairs to put back on the URI, in their original order.
    pub pairs: Vec<(String, String)>,
    pub polluted: bool,
}

/// Keeps the last occurrence of each repeated key. Keys in `allow_list` keep every value.
pub fn collapse_query(pairs: Vec<(String, String)>, allow_list: &[String]) -> CollapsedQuery {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in &pairs {
        grouped.entry(key.clone()).or_default().push(value.clone());
    }

    let allowed = |key: &str| allow_list.iter().any(|allowed| allowed == key);
    let polluted = grouped
        .iter()
        .any(|(key, values)| values.len() > 1 && !allowed(key));

    let mut seen = BTreeMap::new();
    let kept_index: Vec<bool> = pairs
        .iter()
        .enumerate()
        .rev()
        .map(|(index, (key, _))| {
            let first_from_end = seen.insert(key.as_str(), index).is_none();
            first_from_end || allowed(key)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let kept_pairs = pairs
        .iter()
        .zip(kept_index)
        .filter_map(|(pair, keep)| keep.then(|| pair.clone()))
        .collect();

    let values = grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if allowed(&key) && values.len() > 1 {
                QueryValue::Many(values)
            } else {
                // every group holds at least one value
                QueryValue::Single(values.pop().unwrap_or_default())
            };
            (key, value)
        })
        .collect();

    CollapsedQuery {
        values,
        pairs: kept_pairs,
        polluted,
    }
}

pub async fn prevent_parameter_pollution(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    let allow_list = req
        .app_data::<web::Data<SecuritySettings>>()
        .map(|settings| settings.parameter_allow_list.clone())
        .unwrap_or_default();
    let collapsed = collapse_query(parse_query(req.query_string()), &allow_list);

    if collapsed.polluted {
        tracing::debug!(query = %req.query_string(), "Collapsing repeated query parameters");
        if let Err(e) = rewrite_query(&mut req, &collapsed.pairs) {
            return Ok(req.error_response(e).map_into_right_body());
        }
    }
    RequestContext::update(&req, |ctx| ctx.query = collapsed.values);

    next.call(req)
        .await
        .map(ServiceResponse::map_into_left_body)
}
