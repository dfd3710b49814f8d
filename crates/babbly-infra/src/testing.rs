//! Test doubles: a scripted gateway, an in-memory Babbly backend and a
//! navigator that counts redirects.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use babbly_core::domain::{Comment, Post, UserProfile};
use babbly_core::ports::{
    HttpRequest, HttpResponse, HttpTransport, LoginNavigator, Method, TransportError,
};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;
type Latency = dyn Fn(&HttpRequest) -> Option<Duration> + Send + Sync;

/// Gateway stand-in that records every request and answers with `handler`.
pub struct MockGateway {
    handler: Box<Handler>,
    calls: Mutex<Vec<HttpRequest>>,
    latency: Box<Latency>,
}

impl MockGateway {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self::with_latency_by(|_| None, handler)
    }

    /// Like `new`, but every response is delayed so calls overlap.
    pub fn with_latency<F>(latency: Duration, handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self::with_latency_by(move |_| Some(latency), handler)
    }

    /// Delay only the requests `latency` picks.
    pub fn with_latency_by<L, F>(latency: L, handler: F) -> Arc<Self>
    where
        L: Fn(&HttpRequest) -> Option<Duration> + Send + Sync + 'static,
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            latency: Box::new(latency),
        })
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockGateway {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(latency) = (self.latency)(&request) {
            tokio::time::sleep(latency).await;
        }
        (self.handler)(&request)
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl LoginNavigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory Babbly backend. The bearer token doubles as the caller's
/// identity subject id.
#[derive(Default)]
pub struct FakeBackend {
    next_id: u64,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    users: HashMap<String, UserProfile>,
    follows: HashSet<(String, String)>,
}

impl FakeBackend {
    pub fn gateway() -> (Arc<MockGateway>, Arc<Mutex<FakeBackend>>) {
        Self::gateway_with_latency(None)
    }

    pub fn gateway_with_latency(
        latency: Option<Duration>,
    ) -> (Arc<MockGateway>, Arc<Mutex<FakeBackend>>) {
        let state = Arc::new(Mutex::new(FakeBackend::default()));
        let handler_state = state.clone();
        let handler = move |req: &HttpRequest| Ok(handler_state.lock().unwrap().handle(req));

        let gateway = match latency {
            Some(latency) => MockGateway::with_latency(latency, handler),
            None => MockGateway::new(handler),
        };
        (gateway, state)
    }

    /// Backend behind a gateway where `latency` delays some requests and
    /// `intercept` answers some itself.
    pub fn gateway_scripted<L, I>(latency: L, intercept: I) -> (Arc<MockGateway>, Arc<Mutex<FakeBackend>>)
    where
        L: Fn(&HttpRequest) -> Option<Duration> + Send + Sync + 'static,
        I: Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
    {
        let state = Arc::new(Mutex::new(FakeBackend::default()));
        let handler_state = state.clone();
        let handler = move |req: &HttpRequest| {
            Ok(intercept(req).unwrap_or_else(|| handler_state.lock().unwrap().handle(req)))
        };
        (MockGateway::with_latency_by(latency, handler), state)
    }

    pub fn seed_post(&mut self, user_id: &str, content: &str) -> Post {
        let post = Post {
            id: self.allocate_id(),
            ..Post::pending(user_id, content)
        };
        self.posts.insert(0, post.clone());
        post
    }

    pub fn seed_user(&mut self, sub: &str, username: &str) -> UserProfile {
        let user = UserProfile {
            id: self.allocate_id(),
            auth0_id: Some(sub.to_string()),
            username: username.to_string(),
            ..Default::default()
        };
        self.users.insert(sub.to_string(), user.clone());
        user
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn handle(&mut self, req: &HttpRequest) -> HttpResponse {
        let segments: Vec<&str> = req
            .path
            .trim_start_matches("/api/")
            .split('/')
            .collect();
        let caller = req.bearer.as_ref().map(|t| t.as_str().to_string());
        let body = req.body.clone().unwrap_or(Value::Null);

        match (req.method, segments.as_slice()) {
            (Method::Get, ["posts"]) => {
                let (page, size) = paging(req);
                respond(200, page_of(&self.posts, page, size))
            }
            (Method::Get, ["posts", id]) => match self.post(id) {
                Some(post) => respond(200, post),
                None => not_found(),
            },
            (Method::Post, ["posts"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let content = body["content"].as_str().unwrap_or_default();
                if let Some(resp) = reject_content(content) {
                    return resp;
                }
                let post = self.seed_post(&caller, content);
                respond(201, post)
            }
            (Method::Put, ["posts", id]) => {
                let Some(caller) = caller else { return unauthorized() };
                let content = body["content"].as_str().unwrap_or_default().to_string();
                match self.posts.iter_mut().find(|p| p.id == *id) {
                    Some(post) if post.user_id != caller => forbidden(),
                    Some(post) => {
                        post.content = content;
                        respond(200, &*post)
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, ["posts", id]) => {
                let Some(caller) = caller else { return unauthorized() };
                match self.posts.iter().position(|p| p.id == *id) {
                    Some(i) if self.posts[i].user_id != caller => forbidden(),
                    Some(i) => {
                        self.posts.remove(i);
                        HttpResponse::new(204, "")
                    }
                    None => not_found(),
                }
            }
            (method @ (Method::Post | Method::Delete), ["likes"]) => {
                if caller.is_none() {
                    return unauthorized();
                }
                let delta: i64 = if method == Method::Post { 1 } else { -1 };
                let bump = |count: &mut u64| {
                    *count = count.saturating_add_signed(delta);
                    *count
                };
                if let Some(id) = body["postId"].as_str() {
                    match self.posts.iter_mut().find(|p| p.id == id) {
                        Some(post) => {
                            let likes = bump(&mut post.like_count);
                            respond(200, json!({"likes": likes, "liked": delta > 0}))
                        }
                        None => not_found(),
                    }
                } else if let Some(id) = body["commentId"].as_str() {
                    match self.comments.iter_mut().find(|c| c.id == id) {
                        Some(comment) => {
                            let likes = bump(&mut comment.like_count);
                            respond(200, json!({"likes": likes, "liked": delta > 0}))
                        }
                        None => not_found(),
                    }
                } else {
                    respond(400, json!({"message": "postId or commentId is required"}))
                }
            }
            (Method::Get, ["comments", "post", post_id]) => {
                let (page, size) = paging(req);
                let thread: Vec<Comment> = self
                    .comments
                    .iter()
                    .filter(|c| c.post_id == *post_id)
                    .cloned()
                    .collect();
                respond(200, page_of(&thread, page, size))
            }
            (Method::Post, ["comments"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let content = body["content"].as_str().unwrap_or_default();
                if let Some(resp) = reject_content(content) {
                    return resp;
                }
                let post_id = body["postId"].as_str().unwrap_or_default().to_string();
                let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
                    return not_found();
                };
                post.comment_count += 1;
                let comment = Comment {
                    id: self.allocate_id(),
                    ..Comment::pending(post_id, caller, content)
                };
                self.comments.insert(0, comment.clone());
                respond(201, comment)
            }
            (Method::Put, ["comments", id]) => {
                let Some(caller) = caller else { return unauthorized() };
                let content = body["content"].as_str().unwrap_or_default().to_string();
                match self.comments.iter_mut().find(|c| c.id == *id) {
                    Some(c) if c.user_id != caller => forbidden(),
                    Some(c) => {
                        c.content = content;
                        respond(200, &*c)
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, ["comments", id]) => {
                let Some(caller) = caller else { return unauthorized() };
                match self.comments.iter().position(|c| c.id == *id) {
                    Some(i) if self.comments[i].user_id != caller => forbidden(),
                    Some(i) => {
                        let removed = self.comments.remove(i);
                        if let Some(post) = self.posts.iter_mut().find(|p| p.id == removed.post_id) {
                            post.comment_count = post.comment_count.saturating_sub(1);
                        }
                        HttpResponse::new(204, "")
                    }
                    None => not_found(),
                }
            }
            (Method::Get, ["users", "me"]) => {
                let Some(caller) = caller else { return unauthorized() };
                match self.users.get(&caller) {
                    Some(user) => respond(200, user),
                    None => not_found(),
                }
            }
            (Method::Put, ["users", "me"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let Some(user) = self.users.get_mut(&caller) else {
                    return not_found();
                };
                if let Some(name) = body["displayName"].as_str() {
                    user.display_name = Some(name.to_string());
                }
                if let Some(email) = body["email"].as_str() {
                    user.email = Some(email.to_string());
                }
                if let Some(picture) = body["picture"].as_str() {
                    user.picture = Some(picture.to_string());
                }
                if let Some(bio) = body["bio"].as_str() {
                    user.bio = Some(bio.to_string());
                }
                if let Some(verified) = body["emailVerified"].as_bool() {
                    user.email_verified = verified;
                }
                respond(200, &*user)
            }
            (Method::Post, ["users", "profile"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let id = self.allocate_id();
                let user = self.users.entry(caller.clone()).or_insert_with(|| UserProfile {
                    id,
                    auth0_id: Some(caller.clone()),
                    ..Default::default()
                });
                user.username = body["username"].as_str().unwrap_or_default().to_string();
                user.display_name = body["fullName"].as_str().map(str::to_string);
                user.email = body["email"].as_str().map(str::to_string);
                user.picture = body["picture"].as_str().map(str::to_string);
                user.email_verified = body["emailVerified"].as_bool().unwrap_or(false);
                respond(201, &*user)
            }
            (Method::Get, ["profiles", "username", name]) => {
                let user = self.users.values().find(|u| u.username == *name).cloned();
                self.public_profile(user, caller.as_deref(), req)
            }
            (Method::Get, ["profiles", "id", id]) => {
                let user = self.users.values().find(|u| u.id == *id).cloned();
                self.public_profile(user, caller.as_deref(), req)
            }
            (Method::Get, ["profiles", "me"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let user = self.users.get(&caller).cloned();
                self.public_profile(user, Some(caller.as_str()), req)
            }
            (Method::Get, ["users", "username", name]) => {
                match self.users.values().find(|u| u.username == *name) {
                    Some(user) => respond(200, user),
                    None => not_found(),
                }
            }
            // Registered users may read and write; nobody may delete.
            (Method::Post, ["auth", "validate"]) => {
                let Some(caller) = caller else { return unauthorized() };
                let action = body["action"].as_str().unwrap_or_default();
                let authorized = self.users.contains_key(&caller) && matches!(action, "read" | "write");
                respond(200, json!({"authorized": authorized}))
            }
            (method @ (Method::Post | Method::Delete), ["users", "follow", id]) => {
                let Some(caller) = caller else { return unauthorized() };
                if !self.users.values().any(|u| u.id == *id) {
                    return not_found();
                }
                let edge = (caller, id.to_string());
                if method == Method::Post {
                    self.follows.insert(edge);
                } else {
                    self.follows.remove(&edge);
                }
                respond(200, json!({"message": "ok"}))
            }
            (Method::Delete, ["users", "me"]) => {
                let Some(caller) = caller else { return unauthorized() };
                match self.users.remove(&caller) {
                    Some(_) => HttpResponse::new(204, ""),
                    None => not_found(),
                }
            }
            _ => not_found(),
        }
    }

    fn public_profile(&self, user: Option<UserProfile>, caller: Option<&str>, req: &HttpRequest) -> HttpResponse {
        let Some(user) = user else { return not_found() };
        let posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| Some(&p.user_id) == user.auth0_id.as_ref())
            .cloned()
            .collect();
        let followers = self.follows.iter().filter(|(_, t)| *t == user.id).count();
        let following = caller
            .is_some_and(|c| self.follows.contains(&(c.to_string(), user.id.clone())));

        let mut profile = serde_json::to_value(&user).unwrap();
        profile["followersCount"] = json!(followers);
        profile["isFollowing"] = json!(following);
        profile["posts"] = page_of(
            &posts,
            query_param(req, "postsPage", 1),
            query_param(req, "postsPageSize", 10),
        );
        respond(200, profile)
    }
}

fn paging(req: &HttpRequest) -> (usize, usize) {
    (query_param(req, "page", 1), query_param(req, "pageSize", 10))
}

fn query_param(req: &HttpRequest, key: &str, default: usize) -> usize {
    req.query
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(default)
}

fn page_of<T: Clone + serde::Serialize>(items: &[T], page: usize, size: usize) -> Value {
    let start = (page.saturating_sub(1)) * size;
    let slice: Vec<T> = items.iter().skip(start).take(size).cloned().collect();
    json!({
        "items": slice,
        "total": items.len(),
        "hasMore": start + size < items.len(),
    })
}

fn reject_content(content: &str) -> Option<HttpResponse> {
    if content.trim().is_empty() {
        return Some(respond(400, json!({"message": "Post content cannot be empty"})));
    }
    if content.chars().count() > 280 {
        return Some(respond(
            400,
            json!({"message": "Post content cannot exceed 280 characters"}),
        ));
    }
    None
}

fn respond(status: u16, body: impl serde::Serialize) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_string(&body).unwrap())
}

fn not_found() -> HttpResponse {
    respond(404, json!({"message": "Not found"}))
}

fn unauthorized() -> HttpResponse {
    HttpResponse::new(401, "")
}

fn forbidden() -> HttpResponse {
    respond(403, json!({"message": "Can only modify your own content"}))
}
