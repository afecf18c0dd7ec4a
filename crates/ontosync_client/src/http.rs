//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, ureq, a loopback for tests). This module owns
//! request shaping and response classification; everything above it works
//! with typed payloads only.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::ApiTransport;
use ontosync_model::{AnnotationLink, Entity, EntityId, EntityKind, RelationshipLink};
use ontosync_protocol::{
    classify, AnnotationBlank, AnnotationRecord, AnnotationSubmission, CallOutcome, EntityRecord,
    EntitySubmission, ProtocolResult, RelationshipBlank, RelationshipRecord,
    RelationshipSubmission, ReservedId, SearchHit, UserInfo,
};
use serde::Serialize;
use serde_json::json;

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP layer. Both methods
/// return the status code and the raw body; classification happens in the
/// transport, not the client.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str) -> Result<(u16, String), String>;

    /// Sends a POST request with a JSON body.
    fn post(&self, url: &str, body: String) -> Result<(u16, String), String>;
}

/// HTTP-based store transport.
///
/// The API key travels as a request parameter on every call, the way the
/// store expects it.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    api_key: String,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}?key={}", self.base_url, endpoint, self.api_key)
    }

    fn get_outcome<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> ClientResult<CallOutcome<T>> {
        let (status, body) = self
            .client
            .get(&self.url(endpoint))
            .map_err(ClientError::transport_retryable)?;
        Ok(classify(status, &body)?)
    }

    fn post_outcome<Req: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &Req,
    ) -> ClientResult<CallOutcome<T>> {
        let body = serde_json::to_string(request)
            .map_err(|e| ClientError::transport_fatal(format!("failed to encode request: {e}")))?;
        let (status, body) = self
            .client
            .post(&self.url(endpoint), body)
            .map_err(ClientError::transport_retryable)?;
        Ok(classify(status, &body)?)
    }
}

/// Maps the payload of a successful outcome, preserving failures.
fn try_map<T, U>(
    outcome: CallOutcome<T>,
    f: impl FnOnce(T) -> ProtocolResult<U>,
) -> ClientResult<CallOutcome<U>> {
    Ok(match outcome {
        CallOutcome::Ok(value) => CallOutcome::Ok(f(value)?),
        CallOutcome::Conflict(detail) => CallOutcome::Conflict(detail),
        CallOutcome::NotFound => CallOutcome::NotFound,
        CallOutcome::Fatal { status, detail } => CallOutcome::Fatal { status, detail },
    })
}

/// Unwraps a list response; a missing list reads as empty.
fn expect_list<T>(outcome: CallOutcome<Vec<T>>) -> ClientResult<Vec<T>> {
    match outcome {
        CallOutcome::Ok(items) => Ok(items),
        CallOutcome::NotFound => Ok(Vec::new()),
        CallOutcome::Conflict(detail) => Err(ClientError::rejected(400, detail)),
        CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
    }
}

impl<C: HttpClient> ApiTransport for HttpTransport<C> {
    fn user_info(&self) -> ClientResult<CallOutcome<UserInfo>> {
        self.get_outcome("user/info")
    }

    fn reserve_id(&self, label: &str, kind: EntityKind) -> ClientResult<CallOutcome<EntityId>> {
        let outcome = self.post_outcome::<_, ReservedId>(
            "ilx/add",
            &json!({ "term": label, "type": kind.as_str() }),
        )?;
        try_map(outcome, |reserved| reserved.entity_id())
    }

    fn create_entity(&self, submission: &EntitySubmission) -> ClientResult<CallOutcome<EntityId>> {
        let outcome = self.post_outcome::<_, EntityRecord>("term/add", submission)?;
        try_map(outcome, record_id)
    }

    fn edit_entity(
        &self,
        row_id: u64,
        submission: &EntitySubmission,
    ) -> ClientResult<CallOutcome<EntityId>> {
        let outcome =
            self.post_outcome::<_, EntityRecord>(&format!("term/edit/{row_id}"), submission)?;
        try_map(outcome, record_id)
    }

    fn entity_by_id(&self, id: &EntityId) -> ClientResult<CallOutcome<Entity>> {
        let outcome = self.get_outcome::<EntityRecord>(&format!("ilx/{id}"))?;
        match outcome {
            // The lookup endpoint answers 200 with a husk record for ids
            // it has never seen.
            CallOutcome::Ok(record) if record.is_missing() => Ok(CallOutcome::NotFound),
            other => try_map(other, EntityRecord::into_entity),
        }
    }

    fn search_label(&self, label: &str) -> ClientResult<Vec<SearchHit>> {
        expect_list(self.get_outcome(&format!("term/search/{label}"))?)
    }

    fn add_annotation(
        &self,
        submission: &AnnotationSubmission,
    ) -> ClientResult<CallOutcome<AnnotationLink>> {
        let outcome = self.post_outcome::<_, AnnotationRecord>("term/add-annotation", submission)?;
        try_map(outcome, |record| Ok(record.into_link()))
    }

    fn annotations_for(&self, subject_tid: u64) -> ClientResult<Vec<AnnotationLink>> {
        let outcome: CallOutcome<Vec<AnnotationRecord>> =
            self.get_outcome(&format!("term/get-annotations/{subject_tid}"))?;
        Ok(expect_list(outcome)?
            .into_iter()
            .map(AnnotationRecord::into_link)
            .collect())
    }

    fn blank_annotation(&self, link_id: u64) -> ClientResult<CallOutcome<()>> {
        let outcome: CallOutcome<serde_json::Value> = self.post_outcome(
            &format!("term/edit-annotation/{link_id}"),
            &AnnotationBlank::new(),
        )?;
        Ok(outcome.map(|_| ()))
    }

    fn add_relationship(
        &self,
        submission: &RelationshipSubmission,
    ) -> ClientResult<CallOutcome<RelationshipLink>> {
        let outcome =
            self.post_outcome::<_, RelationshipRecord>("term/add-relationship", submission)?;
        try_map(outcome, |record| Ok(record.into_link()))
    }

    fn relationships_for(&self, subject_tid: u64) -> ClientResult<Vec<RelationshipLink>> {
        let outcome: CallOutcome<Vec<RelationshipRecord>> =
            self.get_outcome(&format!("term/get-relationships/{subject_tid}"))?;
        Ok(expect_list(outcome)?
            .into_iter()
            .map(RelationshipRecord::into_link)
            .collect())
    }

    fn blank_relationship(&self, link_id: u64) -> ClientResult<CallOutcome<()>> {
        let outcome: CallOutcome<serde_json::Value> = self.post_outcome(
            &format!("term/edit-relationship/{link_id}"),
            &RelationshipBlank::new(),
        )?;
        Ok(outcome.map(|_| ()))
    }
}

fn record_id(record: EntityRecord) -> ProtocolResult<EntityId> {
    let ilx = record
        .ilx
        .as_deref()
        .ok_or(ontosync_protocol::ProtocolError::IncompleteRecord { field: "ilx" })?;
    Ok(EntityId::parse(ilx)?)
}

/// Reqwest-backed HTTP client.
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
    basic_auth: Option<(String, String)>,
}

impl ReqwestClient {
    /// Builds a client from the given configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::transport_fatal(e.to_string()))?;
        Ok(Self {
            inner,
            basic_auth: config.basic_auth.clone(),
        })
    }

    fn authed(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.basic_auth {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    fn run(&self, request: reqwest::blocking::RequestBuilder) -> Result<(u16, String), String> {
        let response = self.authed(request).send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| e.to_string())?;
        Ok((status, body))
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<(u16, String), String> {
        self.run(self.inner.get(url))
    }

    fn post(&self, url: &str, body: String) -> Result<(u16, String), String> {
        self.run(
            self.inner
                .post(url)
                .header("Content-Type", "application/json")
                .body(body),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<(u16, String)>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<(u16, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .rev()
                        .map(|(status, body)| (status, body.to_string()))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, url: &str) -> Result<(u16, String), String> {
            self.requests.lock().push(url.to_string());
            self.responses
                .lock()
                .pop()
                .ok_or_else(|| "no scripted response left".to_string())
        }
    }

    impl HttpClient for ScriptedClient {
        fn get(&self, url: &str) -> Result<(u16, String), String> {
            self.next(url)
        }

        fn post(&self, url: &str, _body: String) -> Result<(u16, String), String> {
            self.next(url)
        }
    }

    #[test]
    fn key_travels_as_parameter() {
        let client = ScriptedClient::new(vec![(200, r#"{"data": {"id": 7}}"#)]);
        let transport = HttpTransport::new("https://ontology.example.org/api/1/", "sekrit", client);

        let outcome = transport.user_info().unwrap();
        assert!(matches!(outcome, CallOutcome::Ok(info) if info.id == 7));

        let requests = transport.client.requests.lock();
        assert_eq!(
            requests[0],
            "https://ontology.example.org/api/1/user/info?key=sekrit"
        );
    }

    #[test]
    fn husk_lookup_reads_as_not_found() {
        let client = ScriptedClient::new(vec![(200, r#"{"data": {"id": false}}"#)]);
        let transport = HttpTransport::new("https://ontology.example.org/api/1", "k", client);

        let id = EntityId::parse("ont_404").unwrap();
        let outcome = transport.entity_by_id(&id).unwrap();
        assert!(matches!(outcome, CallOutcome::NotFound));
    }

    #[test]
    fn reserve_handles_both_response_shapes() {
        for body in [
            r#"{"data": {"ilx": "tmp_0101431"}}"#,
            r#"{"data": {"fragment": "tmp_0101431"}}"#,
        ] {
            let client = ScriptedClient::new(vec![(200, body)]);
            let transport = HttpTransport::new("https://ontology.example.org/api/1", "k", client);
            let outcome = transport.reserve_id("brain", EntityKind::Term).unwrap();
            match outcome {
                CallOutcome::Ok(id) => assert_eq!(id.to_string(), "tmp_0101431"),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_label_reads_as_conflict() {
        let client = ScriptedClient::new(vec![(
            400,
            r#"{"data": {}, "errormsg": "lexeme already exists"}"#,
        )]);
        let transport = HttpTransport::new("https://ontology.example.org/api/1", "k", client);

        let submission = EntitySubmission::new("brain", EntityKind::Term);
        let outcome = transport.create_entity(&submission).unwrap();
        assert!(outcome.is_conflict());
    }

    #[test]
    fn transport_error_is_retryable() {
        struct DeadClient;
        impl HttpClient for DeadClient {
            fn get(&self, _url: &str) -> Result<(u16, String), String> {
                Err("connection refused".into())
            }
            fn post(&self, _url: &str, _body: String) -> Result<(u16, String), String> {
                Err("connection refused".into())
            }
        }

        let transport = HttpTransport::new("https://ontology.example.org/api/1", "k", DeadClient);
        let err = transport.user_info().unwrap_err();
        assert!(err.is_retryable());
    }
}
