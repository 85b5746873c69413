use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use filmclub_api::api::{create_router, AppState};

fn create_test_server() -> TestServer {
    let app = create_router(AppState::in_memory());
    TestServer::new(app).unwrap()
}

async fn create_user(server: &TestServer, login: &str) -> i64 {
    let response = server
        .post("/users")
        .json(&json!({
            "email": format!("{}@example.com", login),
            "login": login,
            "birthday": "1990-01-01"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

async fn create_film(server: &TestServer, name: &str, genres: Value) -> i64 {
    let response = server
        .post("/films")
        .json(&json!({
            "name": name,
            "description": "",
            "releaseDate": "2000-01-01",
            "duration": 6000,
            "mpa": {"id": 1},
            "genres": genres
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-me"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-me");
}

#[tokio::test]
async fn test_create_and_get_user() {
    let server = create_test_server();
    let id = create_user(&server, "dune").await;

    let response = server.get(&format!("/users/{}", id)).await;
    response.assert_status_ok();
    let user: Value = response.json();
    assert_eq!(user["login"], "dune");
    assert_eq!(user["name"], "dune");

    let response = server.get("/users").await;
    assert_eq!(response.json::<Vec<Value>>().len(), 1);
}

#[tokio::test]
async fn test_invalid_user_is_bad_request() {
    let server = create_test_server();
    let response = server
        .post("/users")
        .json(&json!({"email": "no-at-sign", "login": "x"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_missing_required_fields_are_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/films")
        .json(&json!({"releaseDate": "2000-01-01", "duration": 10}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = server.post("/users").json(&json!({"email": "a@b.c"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = server.post("/directors").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let server = create_test_server();
    server
        .get("/users/404")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_user_update() {
    let server = create_test_server();
    let id = create_user(&server, "paul").await;

    let response = server
        .put("/users")
        .json(&json!({"id": id, "name": "Paul Atreides"}))
        .await;
    response.assert_status_ok();
    let user: Value = response.json();
    assert_eq!(user["name"], "Paul Atreides");
    assert_eq!(user["login"], "paul");
}

#[tokio::test]
async fn test_friendship_flow() {
    let server = create_test_server();
    let a = create_user(&server, "a").await;
    let b = create_user(&server, "b").await;
    let c = create_user(&server, "c").await;

    server
        .put(&format!("/users/{}/friends/{}", a, b))
        .await
        .assert_status_ok();
    let friendships: Value = server.get(&format!("/users/{}/friendships", a)).await.json();
    assert_eq!(friendships[0]["status"], "unconfirmed");

    server
        .put(&format!("/users/{}/friends/{}", b, a))
        .await
        .assert_status_ok();
    let friendships: Value = server.get(&format!("/users/{}/friendships", a)).await.json();
    assert_eq!(friendships[0]["status"], "confirmed");

    server
        .put(&format!("/users/{}/friends/{}", a, c))
        .await
        .assert_status_ok();
    server
        .put(&format!("/users/{}/friends/{}", b, c))
        .await
        .assert_status_ok();
    let common: Value = server
        .get(&format!("/users/{}/friends/common/{}", a, b))
        .await
        .json();
    assert_eq!(ids(&common), vec![c]);

    server
        .delete(&format!("/users/{}/friends/{}", a, b))
        .await
        .assert_status_ok();
    let friends: Value = server.get(&format!("/users/{}/friends", a)).await.json();
    assert_eq!(ids(&friends), vec![c]);
    let friendships: Value = server.get(&format!("/users/{}/friendships", b)).await.json();
    assert_eq!(friendships[0]["friendId"], a);
    assert_eq!(friendships[0]["status"], "unconfirmed");

    server
        .put(&format!("/users/{}/friends/999", a))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_film_crud_and_validation() {
    let server = create_test_server();
    let id = create_film(&server, "Stalker", json!([{"id": 2}])).await;

    let film: Value = server.get(&format!("/films/{}", id)).await.json();
    assert_eq!(film["name"], "Stalker");
    assert_eq!(film["mpa"]["name"], "G");
    assert_eq!(film["genres"][0]["name"], "Drama");

    let response = server
        .post("/films")
        .json(&json!({
            "name": "Too early",
            "releaseDate": "1895-12-28",
            "duration": 60
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/films")
        .json(&json!({
            "name": "Unknown rating",
            "releaseDate": "2001-01-01",
            "duration": 60,
            "mpa": {"id": 42}
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    server
        .delete(&format!("/films/{}", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/films/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popular_films_and_recommendations() {
    let server = create_test_server();
    let f1 = create_film(&server, "F1", json!([{"id": 1}])).await;
    let f2 = create_film(&server, "F2", json!([])).await;
    let f3 = create_film(&server, "F3", json!([])).await;
    let u1 = create_user(&server, "u1").await;
    let u2 = create_user(&server, "u2").await;
    let u3 = create_user(&server, "u3").await;

    for (film, user) in [(f1, u1), (f2, u1), (f1, u2), (f2, u2), (f3, u2), (f1, u3)] {
        server
            .put(&format!("/films/{}/like/{}", film, user))
            .await
            .assert_status_ok();
    }

    let popular: Value = server.get("/films/popular").await.json();
    assert_eq!(ids(&popular), vec![f1, f2, f3]);

    let popular: Value = server.get("/films/popular?count=1&genreId=1").await.json();
    assert_eq!(ids(&popular), vec![f1]);

    let recommended: Value = server
        .get(&format!("/users/{}/recommendations", u1))
        .await
        .json();
    assert_eq!(ids(&recommended), vec![f3]);

    let common: Value = server
        .get(&format!("/films/common?userId={}&friendId={}", u1, u2))
        .await
        .json();
    assert_eq!(ids(&common), vec![f1, f2]);

    let feed: Value = server.get(&format!("/users/{}/feed", u1)).await.json();
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["eventType"], "LIKE");
    assert_eq!(feed[0]["operation"], "ADD");
    assert!(feed[0]["timestamp"].is_i64());
}

#[tokio::test]
async fn test_director_sorting_and_search() {
    let server = create_test_server();
    let response = server
        .post("/directors")
        .json(&json!({"name": "Andrei Tarkovsky"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let director = response.json::<Value>()["id"].as_i64().unwrap();

    let mut film_ids = Vec::new();
    for (name, date) in [("Solaris", "1972-03-20"), ("Ivan's Childhood", "1962-05-09")] {
        let response = server
            .post("/films")
            .json(&json!({
                "name": name,
                "releaseDate": date,
                "duration": 6000,
                "directors": [{"id": director}]
            }))
            .await;
        film_ids.push(response.json::<Value>()["id"].as_i64().unwrap());
    }

    let by_year: Value = server
        .get(&format!("/films/director/{}?sortBy=year", director))
        .await
        .json();
    assert_eq!(ids(&by_year), vec![film_ids[1], film_ids[0]]);

    server
        .get(&format!("/films/director/{}?sortBy=budget", director))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let found: Value = server.get("/films/search?query=tarkov").await.json();
    assert_eq!(ids(&found), film_ids);

    let found: Value = server.get("/films/search?query=SOL&by=title").await.json();
    assert_eq!(ids(&found), vec![film_ids[0]]);
}

#[tokio::test]
async fn test_review_flow() {
    let server = create_test_server();
    let author = create_user(&server, "critic").await;
    let reader = create_user(&server, "reader").await;
    let film = create_film(&server, "Ran", json!([])).await;

    let response = server
        .post("/reviews")
        .json(&json!({
            "content": "Epic",
            "isPositive": true,
            "userId": author,
            "filmId": film
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let review: Value = response.json();
    assert_eq!(review["useful"], 0);
    let review_id = review["reviewId"].as_i64().unwrap();

    server
        .put(&format!("/reviews/{}/like/{}", review_id, reader))
        .await
        .assert_status_ok();
    let review: Value = server.get(&format!("/reviews/{}", review_id)).await.json();
    assert_eq!(review["useful"], 1);

    server
        .delete(&format!("/reviews/{}/like/{}", review_id, reader))
        .await
        .assert_status_ok();
    let reviews: Value = server
        .get(&format!("/reviews?filmId={}&count=5", film))
        .await
        .json();
    assert_eq!(reviews[0]["useful"], 0);

    let response = server
        .post("/reviews")
        .json(&json!({"content": "No polarity", "userId": author, "filmId": film}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server
        .delete(&format!("/reviews/{}", review_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let feed: Value = server.get(&format!("/users/{}/feed", author)).await.json();
    let operations: Vec<_> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["operation"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(operations, vec!["ADD", "REMOVE"]);
}

#[tokio::test]
async fn test_reference_data() {
    let server = create_test_server();
    let genres: Vec<Value> = server.get("/genres").await.json();
    assert_eq!(genres.len(), 6);

    let mpa: Value = server.get("/mpa/5").await.json();
    assert_eq!(mpa["name"], "NC-17");

    server
        .get("/genres/99")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
