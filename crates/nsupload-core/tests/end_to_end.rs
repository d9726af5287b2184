use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::json;
use url::Url;

use nsupload_core::auth::{Credentials, OAuthSigner};
use nsupload_core::client::RestletClient;
use nsupload_core::config::UploadConfig;
use nsupload_core::error::{RestError, TransportError, OUTDATED_ADVISORY};
use nsupload_core::protocol::{RequestKind, RestletRequest};
use nsupload_core::transport::{HttpRequest, HttpResponse, Transport};

const RESTLET: &str =
    "https://1234567.restlets.api.netsuite.com/app/site/hosting/restlet.nl?script=42&deploy=1";

#[derive(Clone, Default)]
struct Recorder {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Recorder {
    fn answering(bodies: Vec<serde_json::Value>) -> Self {
        let recorder = Self::default();
        recorder.responses.lock().unwrap().extend(bodies.into_iter().map(|b| HttpResponse {
            status: 200,
            body: Bytes::from(b.to_string()),
        }));
        recorder
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for Recorder {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Other("unexpected request".into()))
    }
}

fn oauth_config() -> UploadConfig {
    UploadConfig {
        restlet: RESTLET.into(),
        netsuite_key: Some("token-key".into()),
        netsuite_secret: Some("token-secret".into()),
        consumer_token: Some("consumer-key".into()),
        consumer_secret: Some("consumer-secret".into()),
        realm: Some("1234567".into()),
        ..Default::default()
    }
}

/// `oauth_*` parameters of an OAuth header
fn header_params(header: &str) -> BTreeMap<String, String> {
    header
        .trim_start_matches("OAuth ")
        .split(", ")
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.to_string(), value.trim_matches('"').to_string()))
        })
        .collect()
}

/// Re-sign with the nonce and timestamp taken from `header`
fn resign(header: &str, method: &Method, data: &BTreeMap<String, String>) -> String {
    let params = header_params(header);
    let Credentials::OAuth(creds) = oauth_config().credentials().unwrap() else {
        panic!("expected oauth credentials");
    };
    OAuthSigner::new(&creds).authorize_with(
        method,
        &Url::parse(RESTLET).unwrap(),
        data,
        &params["oauth_nonce"],
        params["oauth_timestamp"].parse().unwrap(),
    )
    .unwrap()
}

fn url_query() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("script".to_string(), "42".to_string()),
        ("deploy".to_string(), "1".to_string()),
    ])
}

#[tokio::test]
async fn upload_signs_query_params_only() {
    let recorder = Recorder::answering(vec![
        json!({"restletVersion": "1.0.2"}),
        json!({"success": true}),
    ]);
    let client = RestletClient::new(oauth_config(), "/proj", Box::new(recorder.clone())).unwrap();

    client
        .push_file(Path::new("/proj/src/a.js"), "x=1".into())
        .await
        .unwrap();

    let requests = recorder.requests();
    assert_eq!(requests.len(), 2);

    let upload = &requests[1];
    assert_eq!(upload.method, Method::POST);
    assert_eq!(upload.url.as_str(), RESTLET);
    assert!(upload.query.is_empty());
    assert_eq!(
        upload.body,
        Some(RestletRequest::upload(
            "SuiteScripts/src/a.js".into(),
            "x=1".into()
        ))
    );
    assert_eq!(
        serde_json::to_value(upload.body.as_ref().unwrap()).unwrap(),
        json!({"type": "file", "name": "SuiteScripts/src/a.js", "content": "x=1"})
    );

    assert_eq!(
        upload.authorization,
        resign(&upload.authorization, &Method::POST, &url_query())
    );
}

#[tokio::test]
async fn fetch_signs_query_and_payload() {
    let recorder = Recorder::answering(vec![
        json!({"restletVersion": "1.1.0"}),
        json!([{"content": "x=1"}]),
    ]);
    let client = RestletClient::new(oauth_config(), "/proj", Box::new(recorder.clone())).unwrap();

    client
        .fetch_entry(RequestKind::File, Path::new("/proj/src/a.js"))
        .await
        .unwrap();

    let requests = recorder.requests();
    let version_data = {
        let mut data = url_query();
        data.insert("type".into(), "version".into());
        data
    };
    assert_eq!(
        requests[0].authorization,
        resign(&requests[0].authorization, &Method::GET, &version_data)
    );

    let mut fetch_data = url_query();
    fetch_data.insert("type".into(), "file".into());
    fetch_data.insert("name".into(), "SuiteScripts/src/a.js".into());
    assert_eq!(
        requests[1].authorization,
        resign(&requests[1].authorization, &Method::GET, &fetch_data)
    );
    assert_ne!(
        requests[1].authorization,
        resign(&requests[1].authorization, &Method::GET, &url_query())
    );
}

#[tokio::test]
async fn outdated_endpoint_stops_after_version_request() {
    for op in ["fetch", "push", "delete"] {
        let recorder = Recorder::answering(vec![json!({"restletVersion": "0.9.0"})]);
        let client =
            RestletClient::new(oauth_config(), "/proj", Box::new(recorder.clone())).unwrap();
        let path = Path::new("/proj/src/a.js");

        let result = match op {
            "fetch" => client.fetch_entry(RequestKind::File, path).await,
            "push" => client.push_file(path, "x=1".into()).await,
            _ => client.remove_file(path).await,
        };

        let err = result.unwrap_err();
        assert!(matches!(err, RestError::OutdatedEndpoint { .. }), "{}", op);
        assert_eq!(err.to_string(), OUTDATED_ADVISORY);
        assert_eq!(recorder.requests().len(), 1, "{} sent a data request", op);
    }
}

#[tokio::test]
async fn root_override_changes_remote_name() {
    let recorder = Recorder::answering(vec![
        json!({"restletVersion": "1.0.2"}),
        json!({}),
    ]);
    let config = UploadConfig {
        root_directory: Some("SuiteScripts/Acme".into()),
        authentication: Some("NLAuth nlauth_account=1234567".into()),
        ..oauth_config()
    };
    let client = RestletClient::new(config, "/proj", Box::new(recorder.clone())).unwrap();

    client.remove_file(Path::new("/proj/src/a.js")).await.unwrap();

    let requests = recorder.requests();
    assert_eq!(requests[1].method, Method::DELETE);
    assert_eq!(
        requests[1].query,
        vec![
            ("type".to_string(), "file".to_string()),
            ("name".to_string(), "SuiteScripts/Acme/src/a.js".to_string()),
        ]
    );
    assert!(requests
        .iter()
        .all(|r| r.authorization == "NLAuth nlauth_account=1234567"));
}
