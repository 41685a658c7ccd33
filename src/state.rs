use std::sync::Arc;

use mongodb::Database;

use crate::auth::TokenService;
use crate::db::{self, MongoRepository, Repository};
use crate::media::MediaStore;
use crate::models::{brand::Brand, car::Car, category::Category, review::Review, user::User};

/// Shared per-worker application data, registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn Repository<User>>,
    pub cars: Arc<dyn Repository<Car>>,
    pub brands: Arc<dyn Repository<Brand>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub reviews: Arc<dyn Repository<Review>>,
    pub tokens: Arc<TokenService>,
    pub media: Option<Arc<dyn MediaStore>>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn with_database(
        database: &Database,
        tokens: Arc<TokenService>,
        media: Option<Arc<dyn MediaStore>>,
        bcrypt_cost: u32,
    ) -> Self {
        AppState {
            users: Arc::new(MongoRepository::<User>::new(database, db::USERS)),
            cars: Arc::new(MongoRepository::<Car>::new(database, db::CARS)),
            brands: Arc::new(MongoRepository::<Brand>::new(database, db::BRANDS)),
            categories: Arc::new(MongoRepository::<Category>::new(database, db::CATEGORIES)),
            reviews: Arc::new(MongoRepository::<Review>::new(database, db::REVIEWS)),
            tokens,
            media,
            bcrypt_cost,
        }
    }
}
