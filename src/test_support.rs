use std::sync::{Arc, Mutex};

use actix_web::{http::header, web};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::auth::{password::hash_password, TokenService};
use crate::db::memory::MemoryRepository;
use crate::media::{MediaError, MediaStore, UploadFile, UploadedMedia};
use crate::models::{
    brand::Brand,
    car::Car,
    category::Category,
    review::Review,
    user::{User, UserRole},
};
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "password123";

/// Builds the real route table over in-memory repositories.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(crate::middleware::Authentication::new($ctx.tokens.clone()))
                .app_data($ctx.state.clone())
                .app_data(crate::handlers::json_config())
                .configure(crate::handlers::configure),
        )
        .await
    };
}
pub(crate) use test_app;

#[derive(Default)]
pub struct FakeMedia {
    pub uploaded: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        self.uploaded.lock().unwrap().push(file.file_name.clone());
        Ok(UploadedMedia {
            url: format!("https://media.test/{}", file.file_name),
            public_id: format!("luxury-cars/{}", file.file_name),
            width: None,
            height: None,
            format: None,
            bytes: Some(file.bytes.len() as u64),
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<FakeMedia>,
}

impl TestContext {
    pub fn new() -> Self {
        let tokens = Arc::new(TokenService::new("test-secret", 1));
        let media = Arc::new(FakeMedia::default());
        let media_store: Arc<dyn MediaStore> = media.clone();

        let state = AppState {
            users: Arc::new(MemoryRepository::<User>::default()),
            cars: Arc::new(MemoryRepository::<Car>::default()),
            brands: Arc::new(MemoryRepository::<Brand>::default()),
            categories: Arc::new(MemoryRepository::<Category>::default()),
            reviews: Arc::new(MemoryRepository::<Review>::default()),
            tokens: tokens.clone(),
            media: Some(media_store),
            bcrypt_cost: 4,
        };

        TestContext {
            state: web::Data::new(state),
            tokens,
            media,
        }
    }

    pub async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let now = Utc::now();
        let mut user = User {
            id: None,
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD.to_string(), 4).await.unwrap(),
            name: "Test User".to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        user.id = Some(self.state.users.insert(&user).await.unwrap());
        user
    }

    pub async fn token_for(&self, role: UserRole) -> String {
        let email = format!("{}@example.com", ObjectId::new().to_hex());
        let user = self.seed_user(&email, role).await;
        self.tokens.issue(&user).unwrap()
    }

    pub async fn seed_car(&self, name: &str, brand: &str, daily_price: f64) -> Car {
        let now = Utc::now();
        let mut car = Car {
            id: None,
            brand: brand.to_string(),
            model: name.to_string(),
            name: name.to_string(),
            year: 2023,
            transmission: "automatic".to_string(),
            fuel: "petrol".to_string(),
            mileage: 1000,
            daily_price,
            images: vec![],
            description: None,
            category: None,
            featured: false,
            available: true,
            created_at: now,
            updated_at: now,
        };
        car.id = Some(self.state.cars.insert(&car).await.unwrap());
        car
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Hex id of a serialized document (`{"_id": {"$oid": ...}}`).
pub fn id_of(value: &Value) -> String {
    value["_id"]["$oid"]
        .as_str()
        .expect("document has an ObjectId")
        .to_string()
}
