//! In-process stand-in for the MDD REST API, served by actix-web on an
//! ephemeral port.

use std::collections::HashMap;
use std::net::TcpListener;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const DEV1_PASSWORD: &str = "Passw0rd!";

pub struct StubUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct StubPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub theme_id: i64,
    pub created_at: String,
}

#[derive(Default)]
pub struct StubState {
    pub users: Vec<StubUser>,
    pub tokens: HashMap<String, i64>,
    pub themes: Vec<(i64, String)>,
    pub subscriptions: HashMap<i64, Vec<i64>>,
    pub posts: Vec<StubPost>,
    pub comments: Vec<(i64, i64, i64, String)>,
    pub me_calls: usize,
    next_id: i64,
}

impl StubState {
    fn seeded() -> Self {
        let mut state = StubState {
            next_id: 100,
            ..Default::default()
        };
        state.users.push(StubUser {
            id: 1,
            username: "dev1".to_string(),
            email: "dev1@example.com".to_string(),
            password: DEV1_PASSWORD.to_string(),
        });
        state.users.push(StubUser {
            id: 2,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Al1ce!pass".to_string(),
        });
        state.themes = vec![
            (1, "Rust".to_string()),
            (2, "Java".to_string()),
            (3, "Angular".to_string()),
        ];
        state.subscriptions.insert(1, vec![2]);
        state.posts.push(StubPost {
            id: 10,
            title: "Ownership explained".to_string(),
            content: "Borrowing rules in practice".to_string(),
            author_id: 2,
            theme_id: 1,
            created_at: "2024-03-01T09:00:00".to_string(),
        });
        state.posts.push(StubPost {
            id: 11,
            title: "Spring Boot tips".to_string(),
            content: "Profiles and configuration".to_string(),
            author_id: 1,
            theme_id: 2,
            created_at: "2024-04-01T09:00:00".to_string(),
        });
        state
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn caller(&self, req: &HttpRequest) -> Option<i64> {
        let header = req.headers().get("Authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        self.tokens.get(token).copied()
    }

    fn user_json(&self, id: i64) -> Option<Value> {
        let user = self.users.iter().find(|u| u.id == id)?;
        Some(json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "createdAt": "2024-01-15T10:30:00",
            "followedThemeIds": self.subscriptions.get(&id).cloned().unwrap_or_default(),
        }))
    }

    fn theme_json(&self, id: i64) -> Option<Value> {
        let (id, name) = self.themes.iter().find(|(t, _)| *t == id)?;
        Some(json!({ "id": id, "name": name, "description": format!("All about {}", name) }))
    }

    fn post_json(&self, post: &StubPost) -> Value {
        let author = self.users.iter().find(|u| u.id == post.author_id);
        json!({
            "id": post.id,
            "title": post.title,
            "content": post.content,
            "createdAt": post.created_at,
            "author": author.map(|a| json!({ "id": a.id, "username": a.username, "email": a.email })),
            "theme": self.theme_json(post.theme_id),
        })
    }
}

pub type Shared = web::Data<Mutex<StubState>>;

pub struct StubServer {
    pub base_url: String,
    pub state: Shared,
}

impl StubServer {
    pub fn me_calls(&self) -> usize {
        self.state.lock().me_calls
    }

    pub fn subscriptions_of(&self, user_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .subscriptions
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn spawn_stub() -> StubServer {
    let state: Shared = web::Data::new(Mutex::new(StubState::seeded()));
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub listener");
    let port = listener.local_addr().expect("Listener has no address").port();

    let data = state.clone();
    let server = HttpServer::new(move || {
        App::new().app_data(data.clone()).service(
            web::scope("/api")
                .route("/auth/login", web::post().to(login))
                .route("/auth/register", web::post().to(register))
                .route("/users/me", web::get().to(me))
                .route("/users/{id}", web::get().to(get_user))
                .route("/users/{id}", web::put().to(update_user))
                .route("/themes", web::get().to(list_themes))
                .route("/themes/subscriptions", web::get().to(list_subscriptions))
                .route("/themes/{id}", web::get().to(get_theme))
                .route("/themes/{id}/subscribe", web::post().to(subscribe))
                .route("/themes/{id}/unsubscribe", web::delete().to(unsubscribe))
                .route("/posts", web::get().to(list_posts))
                .route("/posts", web::post().to(create_post))
                .route("/posts/theme/{id}", web::get().to(posts_by_theme))
                .route("/posts/user/{id}", web::get().to(posts_by_user))
                .route("/posts/{id}", web::get().to(get_post))
                .route("/posts/{id}", web::put().to(update_post))
                .route("/posts/{id}", web::delete().to(delete_post))
                .route("/comments/post/{id}", web::get().to(list_comments))
                .route("/comments/post/{id}", web::post().to(create_comment))
                .route("/comments/{id}", web::put().to(update_comment))
                .route("/comments/{id}", web::delete().to(delete_comment)),
        )
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    tokio::spawn(server);

    StubServer {
        base_url: format!("http://127.0.0.1:{}/api", port),
        state,
    }
}

async fn login(state: Shared, body: web::Json<Value>) -> HttpResponse {
    let mut state = state.lock();
    let identifier = body["identifier"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let found = state
        .users
        .iter()
        .find(|u| (u.username == identifier || u.email == identifier) && u.password == password)
        .map(|u| u.id);
    match found {
        Some(user_id) => {
            let token = uuid::Uuid::new_v4().to_string();
            state.tokens.insert(token.clone(), user_id);
            HttpResponse::Ok().json(json!({ "token": token }))
        }
        None => HttpResponse::BadRequest().body("Invalid credentials"),
    }
}

async fn register(state: Shared, body: web::Json<Value>) -> HttpResponse {
    let mut state = state.lock();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if state.users.iter().any(|u| u.email == email) {
        return HttpResponse::BadRequest().body("Email already in use");
    }
    if state.users.iter().any(|u| u.username == username) {
        return HttpResponse::BadRequest().body("Username already in use");
    }
    if username == "silent" {
        return HttpResponse::BadRequest().finish();
    }
    let id = state.next_id();
    state.users.push(StubUser {
        id,
        username,
        email,
        password,
    });
    HttpResponse::Ok().body("User registered successfully")
}

async fn me(state: Shared, req: HttpRequest) -> HttpResponse {
    let mut state = state.lock();
    state.me_calls += 1;
    match state.caller(&req).and_then(|id| state.user_json(id)) {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::Unauthorized().finish(),
    }
}

async fn update_user(
    state: Shared,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut state = state.lock();
    let user_id = path.into_inner();
    if state.caller(&req) != Some(user_id) {
        return HttpResponse::Forbidden().finish();
    }
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state
        .users
        .iter()
        .any(|u| u.id != user_id && (u.username == username || u.email == email))
    {
        return HttpResponse::Conflict().body("Username or email already taken");
    }

    let mut email_changed = false;
    if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
        email_changed = user.email != email;
        user.username = username;
        user.email = email;
        if let Some(password) = body["password"].as_str() {
            user.password = password.to_string();
        }
    }
    if email_changed {
        state.tokens.retain(|_, owner| *owner != user_id);
    }
    match state.user_json(user_id) {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::NotFound().finish(),
    }
}

async fn list_themes(state: Shared) -> HttpResponse {
    let state = state.lock();
    let themes: Vec<Value> = state
        .themes
        .iter()
        .filter_map(|(id, _)| state.theme_json(*id))
        .collect();
    HttpResponse::Ok().json(themes)
}

async fn list_subscriptions(state: Shared, req: HttpRequest) -> HttpResponse {
    let state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let themes: Vec<Value> = state
        .subscriptions
        .get(&user_id)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| state.theme_json(id))
        .collect();
    HttpResponse::Ok().json(themes)
}

async fn subscribe(state: Shared, req: HttpRequest, path: web::Path<i64>) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let theme_id = path.into_inner();
    if state.theme_json(theme_id).is_none() {
        return HttpResponse::NotFound().finish();
    }
    let followed = state.subscriptions.entry(user_id).or_default();
    if !followed.contains(&theme_id) {
        followed.push(theme_id);
    }
    HttpResponse::Ok().finish()
}

async fn unsubscribe(state: Shared, req: HttpRequest, path: web::Path<i64>) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let theme_id = path.into_inner();
    state
        .subscriptions
        .entry(user_id)
        .or_default()
        .retain(|id| *id != theme_id);
    HttpResponse::Ok().finish()
}

async fn list_posts(state: Shared) -> HttpResponse {
    let state = state.lock();
    let posts: Vec<Value> = state.posts.iter().map(|p| state.post_json(p)).collect();
    HttpResponse::Ok().json(posts)
}

async fn posts_by_theme(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    let theme_id = path.into_inner();
    if state.theme_json(theme_id).is_none() {
        return HttpResponse::NotFound().finish();
    }
    let posts: Vec<Value> = state
        .posts
        .iter()
        .filter(|p| p.theme_id == theme_id)
        .map(|p| state.post_json(p))
        .collect();
    HttpResponse::Ok().json(posts)
}

async fn get_post(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    let post_id = path.into_inner();
    match state.posts.iter().find(|p| p.id == post_id) {
        Some(post) => HttpResponse::Ok().json(state.post_json(post)),
        None => HttpResponse::NotFound().finish(),
    }
}

async fn create_post(state: Shared, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let theme_name = body["theme"]["name"].as_str().unwrap_or_default().trim().to_string();
    if theme_name.is_empty() {
        return HttpResponse::BadRequest().finish();
    }
    let existing = state
        .themes
        .iter()
        .find(|(_, name)| *name == theme_name)
        .map(|(id, _)| *id);
    let theme_id = match existing {
        Some(id) => id,
        None => {
            let id = state.next_id();
            state.themes.push((id, theme_name));
            id
        }
    };
    let id = state.next_id();
    let post = StubPost {
        id,
        title: body["title"].as_str().unwrap_or_default().to_string(),
        content: body["content"].as_str().unwrap_or_default().to_string(),
        author_id: user_id,
        theme_id,
        created_at: "2024-05-01T12:00:00".to_string(),
    };
    let created = state.post_json(&post);
    state.posts.push(post);
    HttpResponse::Created().json(created)
}

async fn list_comments(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    let post_id = path.into_inner();
    let comments: Vec<Value> = state
        .comments
        .iter()
        .filter(|(_, post, _, _)| *post == post_id)
        .map(|(id, _, author, content)| {
            json!({
                "id": id,
                "content": content,
                "author": state.user_json(*author),
                "createdAt": "2024-05-02T08:00:00",
            })
        })
        .collect();
    HttpResponse::Ok().json(comments)
}

async fn create_comment(
    state: Shared,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let post_id = path.into_inner();
    if !state.posts.iter().any(|p| p.id == post_id) {
        return HttpResponse::NotFound().finish();
    }
    let id = state.next_id();
    let content = body["content"].as_str().unwrap_or_default().to_string();
    state.comments.push((id, post_id, user_id, content.clone()));
    HttpResponse::Created().json(json!({
        "id": id,
        "content": content,
        "author": state.user_json(user_id),
        "createdAt": "2024-05-02T08:00:00",
    }))
}

async fn get_user(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    match state.user_json(path.into_inner()) {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::NotFound().body("User not found"),
    }
}

async fn get_theme(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    match state.theme_json(path.into_inner()) {
        Some(theme) => HttpResponse::Ok().json(theme),
        None => HttpResponse::NotFound().body("Theme not found"),
    }
}

async fn posts_by_user(state: Shared, path: web::Path<i64>) -> HttpResponse {
    let state = state.lock();
    let user_id = path.into_inner();
    let posts: Vec<Value> = state
        .posts
        .iter()
        .filter(|p| p.author_id == user_id)
        .map(|p| state.post_json(p))
        .collect();
    HttpResponse::Ok().json(posts)
}

async fn update_post(
    state: Shared,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let post_id = path.into_inner();
    let Some(index) = state.posts.iter().position(|p| p.id == post_id) else {
        return HttpResponse::NotFound().body("Post not found");
    };
    if state.posts[index].author_id != user_id {
        return HttpResponse::Forbidden().finish();
    }
    state.posts[index].title = body["title"].as_str().unwrap_or_default().to_string();
    state.posts[index].content = body["content"].as_str().unwrap_or_default().to_string();
    HttpResponse::Ok().json(state.post_json(&state.posts[index]))
}

async fn delete_post(state: Shared, req: HttpRequest, path: web::Path<i64>) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let post_id = path.into_inner();
    let Some(index) = state.posts.iter().position(|p| p.id == post_id) else {
        return HttpResponse::NotFound().body("Post not found");
    };
    if state.posts[index].author_id != user_id {
        return HttpResponse::Forbidden().finish();
    }
    state.posts.remove(index);
    state.comments.retain(|(_, post, _, _)| *post != post_id);
    HttpResponse::NoContent().finish()
}

async fn update_comment(
    state: Shared,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let comment_id = path.into_inner();
    let Some(index) = state.comments.iter().position(|(id, _, _, _)| *id == comment_id) else {
        return HttpResponse::NotFound().body("Comment not found");
    };
    if state.comments[index].2 != user_id {
        return HttpResponse::Forbidden().finish();
    }
    let content = body["content"].as_str().unwrap_or_default().to_string();
    state.comments[index].3 = content.clone();
    HttpResponse::Ok().json(json!({
        "id": comment_id,
        "content": content,
        "author": state.user_json(user_id),
        "createdAt": "2024-05-02T08:00:00",
        "updatedAt": "2024-05-03T08:00:00",
    }))
}

async fn delete_comment(state: Shared, req: HttpRequest, path: web::Path<i64>) -> HttpResponse {
    let mut state = state.lock();
    let Some(user_id) = state.caller(&req) else {
        return HttpResponse::Unauthorized().finish();
    };
    let comment_id = path.into_inner();
    let Some(index) = state.comments.iter().position(|(id, _, _, _)| *id == comment_id) else {
        return HttpResponse::NotFound().body("Comment not found");
    };
    if state.comments[index].2 != user_id {
        return HttpResponse::Forbidden().finish();
    }
    state.comments.remove(index);
    HttpResponse::NoContent().finish()
}
