use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::errors::ServiceError;
use crate::game_manager::GameManager;
use crate::rate_limiter::RateLimiter;
use game_types::{ErrorBody, MessageBody};

pub mod auth;
pub mod config;
pub mod errors;
pub mod game_manager;
pub mod language_sync;
pub mod rate_limiter;
pub mod username_policy;

/// Every parameter any `/online` endpoint reads. All are optional at this
/// level; handlers decide which ones they need.
#[derive(Debug, Default, Deserialize)]
pub struct OnlineQuery {
    user: Option<String>,
    auth: Option<String>,
    guess: Option<String>,
    language: Option<String>,
    new_user: Option<String>,
    new_auth: Option<String>,
    state: Option<String>,
}

#[derive(Debug)]
struct RateLimited;

impl warp::reject::Reject for RateLimited {}

#[derive(Serialize)]
struct WordResponse {
    word: String,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn credentials(query: &OnlineQuery) -> Result<(&str, &str), ServiceError> {
    match (required(&query.user), required(&query.auth)) {
        (Some(user), Some(auth)) => Ok((user, auth)),
        _ => Err(ServiceError::MissingParameters("user and auth")),
    }
}

fn error_reply(err: ServiceError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    warp::reply::with_status(warp::reply::json(&ErrorBody::new(err.to_string())), status)
        .into_response()
}

fn json_reply<T: Serialize>(value: &T) -> Response {
    warp::reply::with_status(warp::reply::json(value), StatusCode::OK).into_response()
}

fn message_reply(message: &str) -> Response {
    json_reply(&MessageBody::new(message))
}

fn respond<T>(result: Result<T, ServiceError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => error_reply(err),
    }
}

fn rate_limited(
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::addr::remote()
        .and(warp::any().map(move || limiter.clone()))
        .and_then(
            |addr: Option<SocketAddr>, limiter: Arc<RateLimiter>| async move {
                let ip = addr
                    .map(|addr| addr.ip())
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                if limiter.check_rate_limit(ip) {
                    Ok(())
                } else {
                    Err(warp::reject::custom(RateLimited))
                }
            },
        )
        .untuple_one()
}

pub fn create_routes(
    game_manager: Arc<GameManager>,
    rate_limiter: Arc<RateLimiter>,
    version: String,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let game_manager_filter = warp::any().map({
        let game_manager = game_manager.clone();
        move || game_manager.clone()
    });

    let server_check = warp::path("server_check")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::with_status("Server is running", StatusCode::OK));

    let online_version = warp::path!("online" / "version")
        .and(warp::get())
        .map(move || version.clone());

    let languages = warp::path!("online" / "languages")
        .and(warp::get())
        .and(game_manager_filter.clone())
        .then(|manager: Arc<GameManager>| async move {
            json_reply(&manager.languages().await)
        });

    let language_checksum = warp::path!("online" / "languages" / "checksum")
        .and(warp::get())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_language_checksum);

    let language_download = warp::path!("online" / "languages" / "download")
        .and(warp::get())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_language_download);

    let limited = rate_limited(rate_limiter);

    let auth_check = warp::path!("online" / "auth_check")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_auth_check);

    let user_check = warp::path!("online" / "user_check" / String)
        .and(warp::get())
        .and(limited.clone())
        .and(game_manager_filter.clone())
        .then(handle_user_check);

    let create_user = warp::path!("online" / "create_user")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_create_user);

    let delete_account = warp::path!("online" / "delete_account")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_delete_account);

    let change_data = warp::path!("online" / "change_data" / String)
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_change_data);

    let start = warp::path!("online" / "start")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_start);

    let guess = warp::path!("online" / "guess")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_guess);

    let word = warp::path!("online" / "word")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_word);

    let stats = warp::path!("online" / "stats")
        .and(warp::get())
        .and(limited.clone())
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter.clone())
        .then(handle_stats);

    let leaderboard = warp::path!("online" / "leaderboard")
        .and(warp::get())
        .and(limited)
        .and(warp::query::<OnlineQuery>())
        .and(game_manager_filter)
        .then(handle_leaderboard);

    server_check
        .or(online_version)
        .or(languages)
        .or(language_checksum)
        .or(language_download)
        .or(auth_check)
        .or(user_check)
        .or(create_user)
        .or(delete_account)
        .or(change_data)
        .or(start)
        .or(guess)
        .or(word)
        .or(stats)
        .or(leaderboard)
        .recover(handle_rejection)
        .with(warp::log("wordle_server"))
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.find::<RateLimited>().is_some() {
        (StatusCode::TOO_MANY_REQUESTS, "Too many requests")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query")
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    };

    Ok(warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status)
        .into_response())
}

async fn handle_language_checksum(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let Some(language) = required(&query.language) else {
        return error_reply(ServiceError::UnknownLanguage(String::new()));
    };
    respond(manager.language_checksum(language).await, |checksum| {
        checksum.into_response()
    })
}

async fn handle_language_download(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let Some(language) = required(&query.language) else {
        return error_reply(ServiceError::UnknownLanguage(String::new()));
    };
    respond(manager.language_document(language).await, |bytes| {
        warp::reply::with_header(bytes, "content-type", "application/json").into_response()
    })
}

async fn handle_auth_check(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    respond(manager.authenticate(user, auth).await, |_| {
        message_reply("Authenticated")
    })
}

async fn handle_user_check(username: String, manager: Arc<GameManager>) -> Response {
    match manager.user_exists(username.trim()).await {
        Ok(true) => message_reply("User found"),
        Ok(false) => warp::reply::with_status(
            warp::reply::json(&ErrorBody::new("User not found")),
            StatusCode::NOT_FOUND,
        )
        .into_response(),
        Err(err) => error_reply(err),
    }
}

async fn handle_create_user(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    respond(manager.create_user(user, auth).await, |_| {
        message_reply("User created")
    })
}

async fn handle_delete_account(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    respond(manager.delete_account(user, auth).await, |_| {
        message_reply("Deleted the account successfully")
    })
}

async fn handle_change_data(
    option: String,
    query: OnlineQuery,
    manager: Arc<GameManager>,
) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };

    match option.as_str() {
        "user" => {
            let Some(new_user) = required(&query.new_user) else {
                return error_reply(ServiceError::MissingParameters("new_user"));
            };
            respond(manager.change_username(user, auth, new_user).await, |_| {
                message_reply("Changed the username successfully")
            })
        }
        "auth" => {
            let Some(new_auth) = required(&query.new_auth) else {
                return error_reply(ServiceError::MissingParameters("new_auth"));
            };
            respond(manager.change_auth(user, auth, new_auth).await, |_| {
                message_reply("Changed the password successfully")
            })
        }
        _ => warp::reply::with_status(
            warp::reply::json(&ErrorBody::new("Invalid option")),
            StatusCode::NOT_FOUND,
        )
        .into_response(),
    }
}

async fn handle_start(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    let language = required(&query.language).unwrap_or_default();
    respond(manager.start_game(user, auth, language).await, |response| {
        json_reply(&response)
    })
}

async fn handle_guess(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth, guess) = match (credentials(&query), required(&query.guess)) {
        (Ok((user, auth)), Some(guess)) => (user, auth, guess),
        _ => return error_reply(ServiceError::MissingParameters("user, auth and guess")),
    };
    respond(manager.submit_guess(user, auth, guess).await, |response| {
        json_reply(&response)
    })
}

async fn handle_word(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    respond(manager.reveal_word(user, auth).await, |word| {
        json_reply(&WordResponse { word })
    })
}

async fn handle_stats(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let (user, auth) = match credentials(&query) {
        Ok(credentials) => credentials,
        Err(err) => return error_reply(err),
    };
    respond(manager.stats(user, auth).await, |stats| json_reply(&stats))
}

async fn handle_leaderboard(query: OnlineQuery, manager: Arc<GameManager>) -> Response {
    let Some(state) = required(&query.state) else {
        return error_reply(ServiceError::MissingParameters("state"));
    };

    match state {
        "global" => respond(manager.leaderboard(None).await, |board| json_reply(&board)),
        "basic" | "user" => {
            let requester = match credentials(&query) {
                Ok(credentials) => credentials,
                Err(err) => return error_reply(err),
            };
            let only_positions = state == "user";
            respond(manager.leaderboard(Some(requester)).await, |board| {
                if only_positions {
                    json_reply(&serde_json::json!({ "user_position": board.user_position }))
                } else {
                    json_reply(&board)
                }
            })
        }
        _ => warp::reply::with_status(
            warp::reply::json(&ErrorBody::new("Wrong state")),
            StatusCode::NOT_FOUND,
        )
        .into_response(),
    }
}
