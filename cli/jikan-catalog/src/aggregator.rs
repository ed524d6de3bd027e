//! Turning raw catalog payloads into pages, detail views and the home feed.

use std::collections::BTreeSet;

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::CatalogClient;
use crate::descriptor::RequestDescriptor;
use crate::error::{FetchError, SequenceError};
use crate::query::{
    AnimeType,
    ListQuery,
    build_detail_queries,
    build_season_now_query,
    build_season_upcoming_query,
    build_top_query,
    home_feed_queries,
};
use crate::types::{
    CatalogItem,
    CatalogPage,
    CharacterEntry,
    FetchState,
    HomeFeed,
    StaffEntry,
    total_pages,
};

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<CatalogItem>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    current_page: Option<u32>,
    #[serde(default)]
    items: Option<PaginationItems>,
}

#[derive(Debug, Deserialize)]
struct PaginationItems {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    per_page: Option<u32>,
}

fn decode<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T, FetchError> {
    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        FetchError::decode(endpoint, path, err.into_inner())
    })
}

fn decode_data<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T, FetchError> {
    decode::<DataEnvelope<T>>(endpoint, payload).map(|envelope| envelope.data)
}

/// Decode a paginated list response.
///
/// The page size is the `limit` the request asked for, falling back to what
/// upstream reports. A request past the last page of a non-empty result is
/// rejected rather than shown as an empty page.
pub(crate) fn decode_list_page(
    descriptor: &RequestDescriptor,
    payload: Value,
) -> Result<CatalogPage, FetchError> {
    let endpoint = descriptor.endpoint();
    let envelope: ListEnvelope = decode(endpoint, payload)?;

    let pagination = envelope.pagination.as_ref();
    let items = pagination.and_then(|pagination| pagination.items.as_ref());

    let total_count = items.and_then(|items| items.total).ok_or_else(|| {
        FetchError::decode(endpoint, "pagination.items.total", "missing total count")
    })?;

    let page_size = descriptor
        .param("limit")
        .and_then(|limit| limit.parse::<u32>().ok())
        .or_else(|| items.and_then(|items| items.per_page))
        .filter(|size| *size > 0)
        .ok_or_else(|| {
            FetchError::decode(endpoint, "pagination.items.per_page", "missing page size")
        })?;

    let page_number = descriptor
        .param("page")
        .and_then(|page| page.parse::<u32>().ok())
        .or_else(|| pagination.and_then(|pagination| pagination.current_page))
        .unwrap_or(1);

    let total_pages = total_pages(total_count, page_size);
    if total_count > 0 && u64::from(page_number) > total_pages {
        return Err(FetchError::PageOutOfRange {
            page: page_number,
            total_pages,
        });
    }

    Ok(CatalogPage {
        items: envelope.data,
        total_count,
        page_size,
        page_number,
    })
}

/// One of the requests a detail view is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailPart {
    Primary,
    Characters,
    Staff,
}

impl DetailPart {
    /// In the order they are requested.
    pub const ALL: [DetailPart; 3] = [DetailPart::Primary, DetailPart::Characters, DetailPart::Staff];
}

/// Detail page of one catalog item, assembled from three requests.
///
/// Each part settles on its own; a failed part leaves the others usable and
/// is listed in [CompositeDetailView::partial_failure].
#[derive(Debug, Clone)]
pub struct CompositeDetailView {
    id: u64,
    primary: FetchState<CatalogItem>,
    characters: FetchState<Vec<CharacterEntry>>,
    staff: FetchState<Vec<StaffEntry>>,
}

impl CompositeDetailView {
    fn new(id: u64) -> Self {
        Self {
            id,
            primary: FetchState::Loading,
            characters: FetchState::Loading,
            staff: FetchState::Loading,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn primary(&self) -> Option<&CatalogItem> {
        self.primary.loaded()
    }

    pub fn characters(&self) -> Option<&[CharacterEntry]> {
        self.characters.loaded().map(Vec::as_slice)
    }

    pub fn staff(&self) -> Option<&[StaffEntry]> {
        self.staff.loaded().map(Vec::as_slice)
    }

    pub fn primary_state(&self) -> &FetchState<CatalogItem> {
        &self.primary
    }

    pub fn characters_state(&self) -> &FetchState<Vec<CharacterEntry>> {
        &self.characters
    }

    pub fn staff_state(&self) -> &FetchState<Vec<StaffEntry>> {
        &self.staff
    }

    pub fn failure(&self, part: DetailPart) -> Option<&FetchError> {
        match part {
            DetailPart::Primary => self.primary.error(),
            DetailPart::Characters => self.characters.error(),
            DetailPart::Staff => self.staff.error(),
        }
    }

    pub fn is_part_settled(&self, part: DetailPart) -> bool {
        match part {
            DetailPart::Primary => self.primary.is_settled(),
            DetailPart::Characters => self.characters.is_settled(),
            DetailPart::Staff => self.staff.is_settled(),
        }
    }

    /// Parts whose request failed.
    pub fn partial_failure(&self) -> BTreeSet<DetailPart> {
        DetailPart::ALL
            .into_iter()
            .filter(|part| self.failure(*part).is_some())
            .collect()
    }

    /// All three parts have settled; the view no longer changes.
    pub fn is_settled(&self) -> bool {
        DetailPart::ALL
            .into_iter()
            .all(|part| self.is_part_settled(part))
    }

    fn settle(&mut self, part: DetailPart, endpoint: &str, payload: Result<Value, FetchError>) {
        match part {
            DetailPart::Primary => {
                self.primary = payload.and_then(|p| decode_data(endpoint, p)).into();
            },
            DetailPart::Characters => {
                self.characters = payload.and_then(|p| decode_data(endpoint, p)).into();
            },
            DetailPart::Staff => {
                self.staff = payload.and_then(|p| decode_data(endpoint, p)).into();
            },
        }
    }
}

impl CatalogClient {
    /// Fetch and decode one list page.
    #[instrument(skip_all, fields(request = %descriptor))]
    pub async fn load_list_page(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<CatalogPage, FetchError> {
        let payload = self.sequencer.execute(descriptor).await?;
        let page = decode_list_page(descriptor, payload)?;
        debug!(
            items = page.items.len(),
            total_count = page.total_count,
            "loaded list page"
        );
        Ok(page)
    }

    pub async fn list_page(&self, query: &ListQuery) -> Result<CatalogPage, FetchError> {
        self.load_list_page(&query.descriptor()).await
    }

    /// Load the detail view of `id`, yielding a snapshot each time a part
    /// settles: primary, then characters, then staff.
    ///
    /// A failing part does not stop the remaining requests. The last of the
    /// three snapshots is settled. Dropping the stream early abandons the
    /// requests that have not been issued yet.
    pub fn load_composite_detail(
        &self,
        id: u64,
    ) -> impl Stream<Item = CompositeDetailView> + '_ {
        stream! {
            let queries = build_detail_queries(id);
            let mut view = CompositeDetailView::new(id);

            for (part, descriptor) in [
                (DetailPart::Primary, &queries.primary),
                (DetailPart::Characters, &queries.characters),
                (DetailPart::Staff, &queries.staff),
            ] {
                let result = self.sequencer.execute(descriptor).await;
                if let Err(err) = &result {
                    debug!(id, ?part, error = %err, "detail part failed");
                }
                view.settle(part, descriptor.endpoint(), result);
                yield view.clone();
            }
        }
    }

    /// Load the settled detail view of `id`.
    #[instrument(skip(self))]
    pub async fn load_detail(&self, id: u64) -> CompositeDetailView {
        self.load_composite_detail(id)
            .fold(CompositeDetailView::new(id), |_, snapshot| async move { snapshot })
            .await
    }

    /// Load all home feed sections, in order, stopping at the first failure.
    #[instrument(skip_all)]
    pub async fn load_home_feed(&self) -> Result<HomeFeed, SequenceError> {
        let queries = home_feed_queries();
        let payloads = self.sequencer.execute_sequence(&queries).await?;

        let mut sections = Vec::with_capacity(payloads.len());
        for (index, (descriptor, payload)) in queries.iter().zip(&payloads).enumerate() {
            match decode_data::<Vec<CatalogItem>>(descriptor.endpoint(), payload.clone()) {
                Ok(items) => sections.push(items),
                Err(source) => {
                    return Err(SequenceError {
                        index,
                        completed: payloads[..index].to_vec(),
                        source,
                    });
                },
            }
        }

        let mut sections = sections.into_iter();
        let mut next = || sections.next().unwrap_or_default();
        Ok(HomeFeed {
            trending: next(),
            popular: next(),
            seasonal: next(),
            upcoming: next(),
            top_movies: next(),
        })
    }

    pub async fn load_top(
        &self,
        limit: std::num::NonZeroU32,
        kind: Option<AnimeType>,
    ) -> Result<CatalogPage, FetchError> {
        self.load_list_page(&build_top_query(limit, kind)).await
    }

    pub async fn load_season_now(&self) -> Result<CatalogPage, FetchError> {
        self.load_list_page(&build_season_now_query()).await
    }

    pub async fn load_season_upcoming(&self) -> Result<CatalogPage, FetchError> {
        self.load_list_page(&build_season_upcoming_query()).await
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::time::Duration;

    use futures::pin_mut;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::config::CatalogClientConfig;
    use crate::query::SortMode;
    use crate::transport::{MockResponse, MockTransport};

    fn item(id: u64) -> Value {
        json!({ "mal_id": id, "title": format!("Title {id}") })
    }

    fn list(ids: &[u64], total: Option<u64>, per_page: u32) -> Value {
        let data: Vec<Value> = ids.iter().copied().map(item).collect();
        let mut items = json!({ "count": ids.len(), "per_page": per_page });
        if let Some(total) = total {
            items["total"] = json!(total);
        }
        json!({
            "data": data,
            "pagination": { "current_page": 1, "has_next_page": false, "items": items }
        })
    }

    fn mock_client(responses: impl IntoIterator<Item = MockResponse>) -> (CatalogClient, MockTransport) {
        let mock = MockTransport::new(responses);
        let config = CatalogClientConfig {
            inter_request_delay: Duration::from_millis(1000),
            ..Default::default()
        };
        (CatalogClient::with_transport(config, mock.clone().into()), mock)
    }

    fn list_descriptor(page: u32) -> RequestDescriptor {
        crate::query::build_list_query(
            NonZeroU32::new(page).unwrap(),
            NonZeroU32::new(24).unwrap(),
            SortMode::Popularity,
            None,
        )
    }

    #[test]
    fn list_page_counts_pages() {
        let page = decode_list_page(&list_descriptor(1), list(&[1, 2, 3], Some(100), 24)).unwrap();
        assert_eq!(page.total_count, 100);
        assert_eq!(page.page_size, 24);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_pages(), 5);
        assert_eq!(page.items.len(), 3);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = decode_list_page(&list_descriptor(1), list(&[], Some(0), 24)).unwrap();
        assert_eq!(page.total_pages(), 0);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn missing_total_is_a_decode_error() {
        let result = decode_list_page(&list_descriptor(1), list(&[1], None, 24));
        assert!(
            matches!(&result, Err(FetchError::Decode { path, .. }) if path == "pagination.items.total"),
            "expected Decode, found: {result:?}"
        );
    }

    #[test]
    fn malformed_item_reports_its_path() {
        let payload = json!({
            "data": [item(1), { "mal_id": "two", "title": "Two" }],
            "pagination": { "items": { "total": 2 } }
        });
        let result = decode_list_page(&list_descriptor(1), payload);
        assert!(
            matches!(&result, Err(FetchError::Decode { path, .. }) if path.starts_with("data") && path.ends_with("mal_id")),
            "expected Decode, found: {result:?}"
        );
    }

    #[test]
    fn null_title_does_not_fail_the_page() {
        let payload = json!({
            "data": [item(1), { "mal_id": 2, "title": null }],
            "pagination": { "items": { "total": 2 } }
        });
        let page = decode_list_page(&list_descriptor(1), payload).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].title, "");
    }

    #[test]
    fn page_past_the_end_is_rejected() {
        let result = decode_list_page(&list_descriptor(6), list(&[], Some(100), 24));
        assert!(
            matches!(result, Err(FetchError::PageOutOfRange {
                page: 6,
                total_pages: 5
            })),
            "expected PageOutOfRange, found: {result:?}"
        );
    }

    #[test]
    fn page_size_falls_back_to_reported_size() {
        let page = decode_list_page(&build_season_now_query(), list(&[1], Some(60), 25)).unwrap();
        assert_eq!(page.page_size, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.page_number, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn composite_detail_yields_a_snapshot_per_part() {
        let (client, mock) = mock_client([
            MockResponse::Json(json!({ "data": item(42) })),
            MockResponse::Json(json!({ "data": [] })),
            MockResponse::Json(json!({ "data": [] })),
        ]);

        let snapshots: Vec<_> = client.load_composite_detail(42).collect().await;
        assert_eq!(snapshots.len(), 3);

        assert!(snapshots[0].is_part_settled(DetailPart::Primary));
        assert!(snapshots[0].characters_state().is_loading());
        assert!(snapshots[0].staff_state().is_loading());

        assert!(snapshots[1].is_part_settled(DetailPart::Characters));
        assert!(!snapshots[1].is_settled());

        assert!(snapshots[2].is_settled());
        assert!(snapshots[2].partial_failure().is_empty());
        assert_eq!(snapshots[2].primary().unwrap().mal_id, 42);

        let endpoints: Vec<_> = mock
            .requests()
            .iter()
            .map(|descriptor| descriptor.endpoint().to_string())
            .collect();
        assert_eq!(endpoints, vec![
            "/anime/42",
            "/anime/42/characters",
            "/anime/42/staff"
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_part_does_not_stop_the_others() {
        let (client, _mock) = mock_client([
            MockResponse::Json(json!({ "data": item(7) })),
            MockResponse::Status(500),
            MockResponse::Json(json!({ "data": [
                { "person": { "mal_id": 1, "name": "Director" }, "positions": ["Director"] }
            ] })),
        ]);

        let view = client.load_detail(7).await;

        assert!(view.is_settled());
        assert_eq!(view.partial_failure(), BTreeSet::from([DetailPart::Characters]));
        assert_eq!(
            view.failure(DetailPart::Characters).and_then(FetchError::status),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert_eq!(view.primary().unwrap().title, "Title 7");
        assert!(view.characters().is_none());
        assert_eq!(view.staff().unwrap()[0].positions, vec!["Director"]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_part_is_a_partial_failure() {
        let (client, _mock) = mock_client([
            MockResponse::Json(json!({ "data": item(7) })),
            MockResponse::Json(json!({ "data": [] })),
            MockResponse::Json(json!({ "unexpected": true })),
        ]);

        let view = client.load_detail(7).await;
        assert_eq!(view.partial_failure(), BTreeSet::from([DetailPart::Staff]));
        assert!(matches!(
            view.failure(DetailPart::Staff),
            Some(FetchError::Decode { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_detail_stream_stops_requests() {
        let (client, mock) = mock_client([
            MockResponse::Json(json!({ "data": item(1) })),
            MockResponse::Json(json!({ "data": [] })),
            MockResponse::Json(json!({ "data": [] })),
        ]);

        {
            let stream = client.load_composite_detail(1);
            pin_mut!(stream);
            let first = stream.next().await.unwrap();
            assert!(first.primary().is_some());
        }

        assert_eq!(mock.requests().len(), 1);
        assert_eq!(mock.remaining(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn home_feed_is_loaded_in_order() {
        let (client, mock) = mock_client([
            MockResponse::Json(list(&[1], Some(1), 5)),
            MockResponse::Json(list(&[2], Some(1), 10)),
            MockResponse::Json(list(&[3], Some(1), 25)),
            MockResponse::Json(list(&[4], Some(1), 25)),
            MockResponse::Json(list(&[5], Some(1), 10)),
        ]);

        let feed = client.load_home_feed().await.unwrap();
        assert_eq!(feed.trending[0].mal_id, 1);
        assert_eq!(feed.popular[0].mal_id, 2);
        assert_eq!(feed.seasonal[0].mal_id, 3);
        assert_eq!(feed.upcoming[0].mal_id, 4);
        assert_eq!(feed.top_movies[0].mal_id, 5);
        assert_eq!(mock.requests(), home_feed_queries().to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn home_feed_stops_at_first_failure() {
        let (client, mock) = mock_client([
            MockResponse::Json(list(&[1], Some(1), 5)),
            MockResponse::Json(list(&[2], Some(1), 10)),
            MockResponse::Status(429),
            MockResponse::Json(list(&[4], Some(1), 25)),
            MockResponse::Json(list(&[5], Some(1), 10)),
        ]);

        let err = client.load_home_feed().await.unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.completed.len(), 2);
        assert_eq!(err.source.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn home_feed_decode_failure_reports_index() {
        let (client, _mock) = mock_client([
            MockResponse::Json(list(&[1], Some(1), 5)),
            MockResponse::Json(json!({ "data": "nope" })),
            MockResponse::Json(list(&[3], Some(1), 25)),
            MockResponse::Json(list(&[4], Some(1), 25)),
            MockResponse::Json(list(&[5], Some(1), 10)),
        ]);

        let err = client.load_home_feed().await.unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.completed.len(), 1);
        assert!(matches!(err.source, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn list_page_over_http() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v4/anime")
                .query_param("page", "2")
                .query_param("limit", "24")
                .query_param("q", "frieren")
                .query_param("order_by", "start_date")
                .query_param("sort", "desc");
            then.status(200).json_body(list(&[52991], Some(30), 24));
        });

        let config = CatalogClientConfig {
            base_url: server.url("/v4"),
            inter_request_delay: Duration::ZERO,
            ..Default::default()
        };
        let client = CatalogClient::new(config).unwrap();
        let query = ListQuery {
            page: NonZeroU32::new(2).unwrap(),
            search: Some("frieren".to_string()),
            sort: SortMode::Newest,
            ..client.list_query()
        };

        let page = client.list_page(&query).await.unwrap();
        mock.assert();
        assert_eq!(page.page_number, 2);
        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.items[0].mal_id, 52991);
    }

    #[tokio::test]
    async fn top_movies_over_http() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/top/anime")
                .query_param("type", "movie")
                .query_param("limit", "10");
            then.status(200).json_body(list(&[1, 2], Some(2), 10));
        });

        let config = CatalogClientConfig {
            base_url: server.base_url(),
            inter_request_delay: Duration::ZERO,
            ..Default::default()
        };
        let client = CatalogClient::new(config).unwrap();
        let page = client
            .load_top(NonZeroU32::new(10).unwrap(), Some(AnimeType::Movie))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_size, 10);
    }
}
