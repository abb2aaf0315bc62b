use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ServiceError, ServiceResult,
    password::PasswordService,
    token::{ArcTokenIssuer, AuthToken},
    upload::{ALLOWED_IMAGE_TYPES, ArcImageStorage, MAX_IMAGE_BYTES, UploadedImage},
    util::validate_email,
    validation::AccountValidator,
};

pub type AccountId = Uuid;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub total_games: i64,
    pub level: i64,
    pub streak_days: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// The id is generated here, before the row ever reaches the store, so
    /// tokens issued for the account always carry a defined subject.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            profile_image: None,
            wins: 0,
            losses: 0,
            draws: 0,
            total_games: 0,
            level: 1,
            streak_days: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            streak_days: self.streak_days,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            total_games: self.total_games,
            profile_image: self.profile_image.clone(),
            level: self.level,
        }
    }
}

/// The caller-facing projection of an account. The password hash has no
/// field here, so it can never leak through serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub streak_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub total_games: i64,
    pub profile_image: Option<String>,
    pub level: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: AccountProfile,
    pub token: AuthToken,
}

pub type ArcAccountRepository = Arc<Box<dyn AccountRepository + Send + Sync + 'static>>;

/// The store's UNIQUE constraint on email is the authoritative uniqueness
/// guard; `insert` maps a violation to `Conflict`.
#[async_trait::async_trait]
pub trait AccountRepository {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Account>>;
    async fn find_active_by_id(&self, id: AccountId) -> ServiceResult<Option<Account>>;
    async fn insert(&self, account: &Account) -> ServiceResult<()>;
    async fn update_username(
        &self,
        id: AccountId,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()>;
    async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()>;
    async fn update_profile_image(
        &self,
        id: AccountId,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()>;
}

pub type ArcAccountService = Arc<Box<dyn AccountService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait AccountService {
    async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ServiceResult<AuthResponse>;
    async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthResponse>;
    async fn get_profile(&self, id: AccountId) -> ServiceResult<AccountProfile>;
    async fn update_username(&self, id: AccountId, new_username: &str) -> ServiceResult<String>;
    async fn update_password(
        &self,
        id: AccountId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> ServiceResult<String>;
    async fn upload_profile_image(
        &self,
        id: AccountId,
        image: UploadedImage,
    ) -> ServiceResult<String>;
}

pub struct AccountServiceImpl {
    repository: ArcAccountRepository,
    validator: AccountValidator,
    password: PasswordService,
    tokens: ArcTokenIssuer,
    images: ArcImageStorage,
}

impl AccountServiceImpl {
    pub fn new(
        repository: ArcAccountRepository,
        tokens: ArcTokenIssuer,
        images: ArcImageStorage,
    ) -> Self {
        Self {
            validator: AccountValidator::new(repository.clone()),
            password: PasswordService::new(),
            repository,
            tokens,
            images,
        }
    }

    async fn fetch_active_account(&self, id: AccountId) -> ServiceResult<Account> {
        match self.repository.find_active_by_id(id).await? {
            Some(account) => Ok(account),
            None => ServiceError::not_found("Account not found"),
        }
    }
}

#[async_trait::async_trait]
impl AccountService for AccountServiceImpl {
    async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ServiceResult<AuthResponse> {
        let email = validate_email(email)?;
        self.validator.validate_email_uniqueness(&email).await?;

        let password_hash = self.password.hash_password(password)?;
        let account = Account::new(email, username.to_string(), password_hash);

        // Token is issued only after the row is persisted.
        self.repository.insert(&account).await?;
        let token = self.tokens.generate_token(account.id, &account.email)?;

        log::info!("Registered account {} ({})", account.username, account.id);
        Ok(AuthResponse {
            user: account.profile(),
            token,
        })
    }

    async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthResponse> {
        let account = self.validator.validate_email_exists(email).await?;
        if !account.is_active {
            return ServiceError::unauthorized("Credentials are incorrect");
        }
        self.password
            .compare_password(password, &account.password_hash)?;

        let token = self.tokens.generate_token(account.id, &account.email)?;
        log::info!("Account {} logged in", account.id);
        Ok(AuthResponse {
            user: account.profile(),
            token,
        })
    }

    async fn get_profile(&self, id: AccountId) -> ServiceResult<AccountProfile> {
        let account = self.fetch_active_account(id).await?;
        Ok(account.profile())
    }

    async fn update_username(&self, id: AccountId, new_username: &str) -> ServiceResult<String> {
        let account = self.fetch_active_account(id).await?;
        if account.username == new_username {
            return ServiceError::bad_request(
                "New username must be different from current username",
            );
        }
        self.repository
            .update_username(id, new_username, Utc::now())
            .await?;
        Ok("Username updated successfully".to_string())
    }

    async fn update_password(
        &self,
        id: AccountId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> ServiceResult<String> {
        let account = self.fetch_active_account(id).await?;

        self.password
            .compare_password(current, &account.password_hash)?;
        self.password
            .ensure_different_from_previous(new, &account.password_hash)?;
        self.password.validate_confirmation(new, confirm)?;

        let password_hash = self.password.hash_password(new)?;
        self.repository
            .update_password(id, &password_hash, Utc::now())
            .await?;
        Ok("Password updated successfully".to_string())
    }

    async fn upload_profile_image(
        &self,
        id: AccountId,
        image: UploadedImage,
    ) -> ServiceResult<String> {
        self.fetch_active_account(id).await?;

        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return ServiceError::bad_request(
                "Invalid file type. Only JPEG, PNG, WebP, and GIF images are allowed.",
            );
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return ServiceError::bad_request(
                "File size too large. Maximum allowed size is 5MB.",
            );
        }

        let extension = image
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("jpg");
        let key = format!(
            "profile-{}-{}.{}",
            id,
            Utc::now().timestamp_millis(),
            extension
        );

        match self
            .images
            .upload(&key, &image.content_type, image.bytes)
            .await
        {
            Ok(url) => {
                self.repository
                    .update_profile_image(id, &url, Utc::now())
                    .await?;
                Ok("Profile image uploaded successfully".to_string())
            }
            Err(e) => {
                log::error!("Error uploading profile image for {}: {}", id, e);
                ServiceError::internal("Failed to upload profile image")
            }
        }
    }
}

#[derive(Default, Clone)]
pub struct MockAccountRepository {
    accounts: Arc<std::sync::Mutex<std::collections::HashMap<AccountId, Account>>>,
}

impl MockAccountRepository {
    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.accounts.lock().unwrap().get(&id).cloned()
    }

    pub fn put(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }
}

#[async_trait::async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_active_by_id(&self, id: AccountId) -> ServiceResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&id)
            .filter(|a| a.is_active)
            .cloned())
    }

    async fn insert(&self, account: &Account) -> ServiceResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == account.email) {
            return ServiceError::conflict("Email already registered");
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_username(
        &self,
        id: AccountId,
        username: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&id) {
            account.username = username.to_string();
            account.updated_at = updated_at;
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&id) {
            account.password_hash = password_hash.to_string();
            account.updated_at = updated_at;
        }
        Ok(())
    }

    async fn update_profile_image(
        &self,
        id: AccountId,
        url: &str,
        updated_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&id) {
            account.profile_image = Some(url.to_string());
            account.updated_at = updated_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{token::MockTokenIssuer, upload::MockImageStorage};

    use super::*;

    fn make_service() -> (AccountServiceImpl, MockAccountRepository, MockImageStorage) {
        let repository = MockAccountRepository::default();
        let images = MockImageStorage::default();
        let service = AccountServiceImpl::new(
            Arc::new(Box::new(repository.clone())),
            Arc::new(Box::new(MockTokenIssuer)),
            Arc::new(Box::new(images.clone())),
        );
        (service, repository, images)
    }

    #[tokio::test]
    async fn test_register_stores_verifiable_hash_and_issues_token() {
        let (service, repository, _) = make_service();
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();

        assert_eq!(response.user.email, "a@x.com");
        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.level, 1);
        assert!(response.token.access_token.starts_with("Bearer "));

        let stored = repository.get(response.user.id).unwrap();
        assert_ne!(stored.password_hash, "Secret123!");
        assert!(bcrypt::verify("Secret123!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (service, _, _) = make_service();
        service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();
        let err = service
            .register("a@x.com", "bob", "Other456!")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let (service, _, _) = make_service();
        let err = service
            .register("not-an-email", "alice", "Secret123!")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_login_succeeds_then_rejects_wrong_password() {
        let (service, _, _) = make_service();
        service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();

        let response = service.login("a@x.com", "Secret123!").await.unwrap();
        assert_eq!(response.user.email, "a@x.com");
        assert!(response.token.access_token.starts_with("Bearer "));

        let err = service.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_unauthorized() {
        let (service, _, _) = make_service();
        let err = service.login("nobody@x.com", "Secret123!").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_inactive_account_is_unauthorized() {
        let (service, repository, _) = make_service();
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();
        let mut account = repository.get(response.user.id).unwrap();
        account.is_active = false;
        repository.put(account);

        let err = service.login("a@x.com", "Secret123!").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_get_profile_missing_account_is_not_found() {
        let (service, _, _) = make_service();
        let err = service.get_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_username_rejects_current_value() {
        let (service, repository, _) = make_service();
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();
        let id = response.user.id;

        let err = service.update_username(id, "alice").await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let message = service.update_username(id, "alice2").await.unwrap();
        assert_eq!(message, "Username updated successfully");
        assert_eq!(repository.get(id).unwrap().username, "alice2");
    }

    #[tokio::test]
    async fn test_update_password_checks_and_persists() {
        let (service, _, _) = make_service();
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();
        let id = response.user.id;

        let err = service
            .update_password(id, "wrong", "Other456!", "Other456!")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = service
            .update_password(id, "Secret123!", "Secret123!", "Secret123!")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let err = service
            .update_password(id, "Secret123!", "Other456!", "Mismatch789!")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        service
            .update_password(id, "Secret123!", "Other456!", "Other456!")
            .await
            .unwrap();
        service.login("a@x.com", "Other456!").await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_profile_image_validates_and_persists_url() {
        let (service, repository, images) = make_service();
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();
        let id = response.user.id;

        let err = service
            .upload_profile_image(
                id,
                UploadedImage {
                    filename: "avatar.pdf".into(),
                    content_type: "application/pdf".into(),
                    bytes: vec![0u8; 16],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let err = service
            .upload_profile_image(
                id,
                UploadedImage {
                    filename: "avatar.png".into(),
                    content_type: "image/png".into(),
                    bytes: vec![0u8; MAX_IMAGE_BYTES + 1],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let message = service
            .upload_profile_image(
                id,
                UploadedImage {
                    filename: "avatar.png".into(),
                    content_type: "image/png".into(),
                    bytes: vec![0u8; 16],
                },
            )
            .await
            .unwrap();
        assert_eq!(message, "Profile image uploaded successfully");

        let keys = images.uploaded_keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(&format!("profile-{}-", id)));
        assert!(keys[0].ends_with(".png"));
        let stored = repository.get(id).unwrap();
        assert_eq!(
            stored.profile_image.as_deref(),
            Some(format!("https://images.example.com/{}", keys[0]).as_str())
        );
    }

    #[tokio::test]
    async fn test_upload_profile_image_storage_failure_is_internal() {
        let repository = MockAccountRepository::default();
        let images = MockImageStorage {
            fail: true,
            ..Default::default()
        };
        let service = AccountServiceImpl::new(
            Arc::new(Box::new(repository.clone())),
            Arc::new(Box::new(MockTokenIssuer)),
            Arc::new(Box::new(images)),
        );
        let response = service
            .register("a@x.com", "alice", "Secret123!")
            .await
            .unwrap();

        let err = service
            .upload_profile_image(
                response.user.id,
                UploadedImage {
                    filename: "avatar.png".into(),
                    content_type: "image/png".into(),
                    bytes: vec![0u8; 16],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert!(repository.get(response.user.id).unwrap().profile_image.is_none());
    }
}
