//! Merging the views produced by one middleware phase.
//!
//! Every middleware in a phase starts from the same input message. Their
//! outputs are folded back into one message in order: the first output seeds
//! the result and supplies the context, each later output overlays its
//! non-empty bodies, every header it carries and its status if set. The last
//! contributor wins, even when it returned its copy untouched.

use axum::http::HeaderMap;

use crate::message::{Body, Message};

/// Fold phase outputs into one message. No outputs means no middleware ran
/// and the input passes through.
pub fn merge(input: Message, outputs: Vec<Message>) -> Message {
    let mut outputs = outputs.into_iter();
    let Some(mut merged) = outputs.next() else {
        return input;
    };

    for output in outputs {
        overlay_body(&mut merged.request.body, output.request.body);
        overlay_headers(&mut merged.request.headers, &output.request.headers);

        overlay_body(&mut merged.response.body, output.response.body);
        overlay_headers(&mut merged.response.headers, &output.response.headers);

        if output.response.status.is_some() {
            merged.response.status = output.response.status;
        }
    }

    merged
}

fn overlay_body(into: &mut Body, contributed: Body) {
    if !contributed.is_empty() {
        *into = contributed;
    }
}

/// Apply every header a contributor carries, replacing all values for that
/// name. Names the contributor lacks are left alone.
fn overlay_headers(into: &mut HeaderMap, contributed: &HeaderMap) {
    for name in contributed.keys() {
        into.remove(name);
        for value in contributed.get_all(name) {
            into.append(name.clone(), value.clone());
        }
    }
}
