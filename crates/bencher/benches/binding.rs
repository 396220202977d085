use bencher::{Payload, PayloadKind};
use bytes::Bytes;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::{Method, Request};
use http_body_util::Full;
use micro_hx::binding::{Bind, Binder, ExtractFields, Files, Values, map_to};
use micro_hx::handler::HandlerError;
use micro_hx::router::{Router, get, post};
use micro_hx::typed;
use serde::Deserialize;
use std::hint::black_box;

static SEARCH_SMALL: Payload = Payload::query("search_small", include_str!("../resources/query/search_small.txt"));
static SEARCH_LARGE: Payload = Payload::query("search_large", include_str!("../resources/query/search_large.txt"));
static PROFILE_FORM: Payload = Payload::form("profile_form", include_str!("../resources/form/profile.txt"));

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
#[allow(dead_code, reason = "fields are only bound, never read")]
struct Search {
    q: String,
    page: u32,
    per_page: u32,
    sort: String,
    desc: bool,
    min_score: Option<f64>,
    owner: Option<String>,
    language: Option<String>,
    #[serde(rename = "tag")]
    tags: Vec<String>,
    #[serde(rename = "id")]
    ids: Vec<u64>,
}

impl ExtractFields for Search {}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
#[allow(dead_code, reason = "fields are only bound, never read")]
struct Profile {
    name: String,
    email: String,
    age: u8,
    newsletter: bool,
    country: String,
    bio: String,
    #[serde(rename = "interest")]
    interests: Vec<String>,
}

impl ExtractFields for Profile {}

fn payloads() -> Vec<Payload> {
    vec![SEARCH_SMALL, SEARCH_LARGE, PROFILE_FORM]
}

fn bind(values: &Values, kind: PayloadKind) {
    match kind {
        PayloadKind::Query => {
            black_box(map_to::<Search>(values, &Files::new()).expect("search payload should bind"));
        }
        PayloadKind::Form => {
            black_box(map_to::<Profile>(values, &Files::new()).expect("profile payload should bind"));
        }
    }
}

fn benchmark_map_to(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("map_to");

    for payload in payloads() {
        group.throughput(Throughput::Bytes(payload.content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(payload.name()), &payload, |b, payload| {
            b.iter_batched_ref(
                || Values::parse(payload.content()).expect("payload should be url-encoded"),
                |values| bind(values, payload.kind()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_binder_select(criterion: &mut Criterion) {
    let cases = [
        ("get_json", Method::GET, Some("application/json")),
        ("post_json", Method::POST, Some("application/json; charset=utf-8")),
        ("post_multipart", Method::POST, Some("multipart/form-data; boundary=X")),
        ("put_unknown", Method::PUT, Some("text/csv")),
        ("patch_none", Method::PATCH, None),
    ];

    let mut group = criterion.benchmark_group("binder_select");
    for (name, method, content_type) in cases {
        group.bench_function(name, |b| b.iter(|| black_box(Binder::select(black_box(&method), black_box(content_type)))));
    }
    group.finish();
}

async fn search(Bind(req): Bind<Search>) -> Result<String, HandlerError> {
    Ok(req.q)
}

async fn profile(Bind(req): Bind<Profile>) -> Result<String, HandlerError> {
    Ok(req.name)
}

fn benchmark_dispatch(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should start");
    let router = Router::builder()
        .route("/search", get(typed(search).string()))
        .route("/profile", post(typed(profile).string()))
        .build()
        .expect("routes should not conflict");

    let mut group = criterion.benchmark_group("dispatch");
    for payload in payloads() {
        let (method, path) = match payload.kind() {
            PayloadKind::Query => (Method::GET, "/search"),
            PayloadKind::Form => (Method::POST, "/profile"),
        };

        group.throughput(Throughput::Bytes(payload.content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(payload.name()), &payload, |b, payload| {
            b.iter_batched(
                || {
                    let mut builder = Request::builder().method(method.clone()).uri(payload.uri(path));
                    if let Some(content_type) = payload.content_type() {
                        builder = builder.header(http::header::CONTENT_TYPE, content_type);
                    }
                    builder.body(Full::new(Bytes::from_static(payload.body().as_bytes()))).expect("request should be valid")
                },
                |request| black_box(runtime.block_on(router.handle(request))),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(binding, benchmark_map_to, benchmark_binder_select, benchmark_dispatch);
criterion_main!(binding);
