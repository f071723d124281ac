use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    configs::CacheStore,
    constants::{OTP_MAX_ATTEMPTS, OTP_RATE_WINDOW, VERIFIED_EMAIL_TTL},
    modules::{
        auth::{
            model::{
                OtpRecord, SignUpModel, TokenPair, VerifyOtpModel, VerifyOutcome, normalize_email,
            },
            otp::OtpSender,
        },
        image::repository::ImageRepository,
        university::repository::UniversityRepository,
        user::{
            model::{InsertUser, ProfileResponse},
            repository::UserRepository,
            schema::UserEntity,
            service::UserService,
        },
    },
    utils::{Claims, TypeClaims, generate_otp, hash_secret, verify_secret},
};

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    pub otp_ttl: u64,
    pub otp_max_requests: u64,
}

fn otp_key(email: &str) -> String {
    format!("otp:{email}")
}

fn verified_key(email: &str) -> String {
    format!("verified_email:{email}")
}

fn refresh_key(jti: &Uuid) -> String {
    format!("refresh_token:{jti}")
}

#[derive(Clone)]
pub struct AuthService<U, N, I, K, S>
where
    U: UserRepository + Send + Sync,
    N: UniversityRepository + Send + Sync,
    I: ImageRepository + Send + Sync,
    K: CacheStore,
    S: OtpSender + Send + Sync,
{
    users: Arc<U>,
    universities: Arc<N>,
    user_service: UserService<U, N, I, K>,
    cache: Arc<K>,
    sender: Arc<S>,
    config: AuthConfig,
}

impl<U, N, I, K, S> AuthService<U, N, I, K, S>
where
    U: UserRepository + Send + Sync,
    N: UniversityRepository + Send + Sync,
    I: ImageRepository + Send + Sync,
    K: CacheStore,
    S: OtpSender + Send + Sync,
{
    pub fn with_dependencies(
        users: Arc<U>,
        universities: Arc<N>,
        user_service: UserService<U, N, I, K>,
        cache: Arc<K>,
        sender: Arc<S>,
        config: AuthConfig,
    ) -> Self {
        info!("AuthService initialized with dependencies");
        AuthService { users, universities, user_service, cache, sender, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub async fn request_otp(&self, email: &str) -> Result<bool, error::SystemError> {
        let email = normalize_email(email);

        let count =
            self.cache.incr_with_ttl(&format!("otp_requests:{email}"), OTP_RATE_WINDOW).await?;
        if count > self.config.otp_max_requests {
            return Err(error::SystemError::too_many_requests(
                "Too many OTP requests, please try again later",
            ));
        }

        let code = generate_otp();
        let record = OtpRecord { hash: hash_secret(&code)?, attempts: 0 };
        self.cache.set(&otp_key(&email), &record, self.config.otp_ttl as usize).await?;

        self.sender.send(&email, &code).await?;

        let is_new_user = self.users.find_by_email(&email).await?.is_none();
        Ok(is_new_user)
    }

    pub async fn verify_otp(&self, model: VerifyOtpModel) -> Result<VerifyOutcome, error::SystemError> {
        let email = normalize_email(&model.email);
        let key = otp_key(&email);

        let mut record = self
            .cache
            .get::<OtpRecord>(&key)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("OTP expired or not requested"))?;

        if record.attempts >= OTP_MAX_ATTEMPTS {
            self.cache.delete(&key).await?;
            return Err(error::SystemError::too_many_requests(
                "Too many failed attempts, request a new OTP",
            ));
        }

        if !verify_secret(&record.hash, model.otp.trim())? {
            record.attempts += 1;
            if record.attempts >= OTP_MAX_ATTEMPTS {
                self.cache.delete(&key).await?;
            } else {
                self.cache.set(&key, &record, self.config.otp_ttl as usize).await?;
            }
            return Err(error::SystemError::unauthorized("Invalid OTP"));
        }

        self.cache.delete(&key).await?;

        match self.users.find_by_email(&email).await? {
            Some(user) => {
                let tokens = self.issue_tokens(&user).await?;
                let user = self.user_service.profile_for(user).await?;
                info!("User {} signed in", user.id);
                Ok(VerifyOutcome::Existing { user, tokens })
            }
            None => {
                self.cache.set(&verified_key(&email), &true, VERIFIED_EMAIL_TTL as usize).await?;
                Ok(VerifyOutcome::NewUser)
            }
        }
    }

    pub async fn sign_up(
        &self,
        model: SignUpModel,
    ) -> Result<(ProfileResponse, TokenPair), error::SystemError> {
        let email = normalize_email(&model.email);

        if self.cache.get::<bool>(&verified_key(&email)).await?.is_none() {
            return Err(error::SystemError::unauthorized("Email has not been verified"));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(error::SystemError::conflict("Email already exists"));
        }

        if let Some(university_id) = model.university_id {
            let university = self
                .universities
                .find_by_id(&university_id)
                .await?
                .ok_or_else(|| error::SystemError::not_found("University not found"))?;

            if !university.accepts_email(&email) {
                return Err(error::SystemError::bad_request(
                    "Email does not belong to the selected university",
                ));
            }
        }

        let new_user = InsertUser {
            email: email.clone(),
            name: model.name.trim().to_string(),
            gender: model.gender,
            bio: model.bio,
            university_id: model.university_id,
            degree: model.degree,
            year: model.year,
        };

        let user = self.users.create(&new_user).await?;
        self.cache.delete(&verified_key(&email)).await?;

        let tokens = self.issue_tokens(&user).await?;
        info!("User {} signed up", user.id);
        let profile = self.user_service.profile_for(user).await?;
        Ok((profile, tokens))
    }

    async fn issue_tokens(&self, user: &UserEntity) -> Result<TokenPair, error::SystemError> {
        let secret = self.config.jwt_secret.as_bytes();

        let access_token = Claims::new(&user.id, &user.role, self.config.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(secret)?;

        let jti = Uuid::now_v7();
        let refresh_token = Claims::new(&user.id, &user.role, self.config.refresh_token_expiration)
            .with_jti(jti)
            .with_type(TypeClaims::RefreshToken)
            .encode(secret)?;

        self.cache
            .set(&refresh_key(&jti), &user.id, self.config.refresh_token_expiration as usize)
            .await?;

        Ok(TokenPair { access_token, refresh_token })
    }

    fn decode_refresh(&self, token: &str) -> Result<(Claims, Uuid), error::SystemError> {
        let claims = Claims::decode(token, self.config.jwt_secret.as_bytes())?;
        if claims._type != Some(TypeClaims::RefreshToken) {
            return Err(error::SystemError::unauthorized("Refresh token required"));
        }
        let jti = claims.jti.ok_or_else(|| error::SystemError::unauthorized("Invalid token"))?;
        Ok((claims, jti))
    }

    /// Rotates the refresh token; the presented one is revoked.
    pub async fn refresh(&self, token: Option<String>) -> Result<TokenPair, error::SystemError> {
        let token = token.ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;
        let (claims, jti) = self.decode_refresh(&token)?;

        let key = refresh_key(&jti);
        let owner = self
            .cache
            .get::<Uuid>(&key)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Refresh token revoked"))?;

        if owner != claims.sub {
            return Err(error::SystemError::unauthorized("Invalid token"));
        }

        self.cache.delete(&key).await?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("User no longer exists"))?;

        self.issue_tokens(&user).await
    }

    pub async fn logout(&self, token: Option<String>) -> Result<(), error::SystemError> {
        let Some(token) = token else {
            return Ok(());
        };

        // an expired or foreign token has nothing to revoke
        if let Ok((_, jti)) = self.decode_refresh(&token) {
            self.cache.delete(&refresh_key(&jti)).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;
    use crate::{
        modules::{
            image::{model::UploadConfig, service::ImageService},
            user::schema::Gender,
        },
        test::{
            InMemoryCache, InMemoryImageRepository, InMemoryUniversityRepository,
            InMemoryUserRepository,
        },
    };

    /// Keeps the last code sent to each address.
    #[derive(Default)]
    struct CapturingOtpSender {
        codes: Mutex<HashMap<String, String>>,
    }

    impl CapturingOtpSender {
        fn code_for(&self, email: &str) -> String {
            self.codes.lock().unwrap().get(email).cloned().unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl OtpSender for CapturingOtpSender {
        async fn send(&self, email: &str, code: &str) -> Result<(), error::SystemError> {
            self.codes.lock().unwrap().insert(email.to_string(), code.to_string());
            Ok(())
        }
    }

    type TestAuthService = AuthService<
        InMemoryUserRepository,
        InMemoryUniversityRepository,
        InMemoryImageRepository,
        InMemoryCache,
        CapturingOtpSender,
    >;

    struct Fixture {
        service: TestAuthService,
        users: Arc<InMemoryUserRepository>,
        universities: Arc<InMemoryUniversityRepository>,
        cache: Arc<InMemoryCache>,
        sender: Arc<CapturingOtpSender>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::default());
        let universities = Arc::new(InMemoryUniversityRepository::default());
        let cache = Arc::new(InMemoryCache::default());
        let sender = Arc::new(CapturingOtpSender::default());
        let images = ImageService::new(
            Arc::new(InMemoryImageRepository::default()),
            UploadConfig::new(std::env::temp_dir().to_string_lossy(), "/media", 1024),
        );
        let user_service = UserService::with_dependencies(
            users.clone(),
            universities.clone(),
            images,
            cache.clone(),
        );
        let service = AuthService::with_dependencies(
            users.clone(),
            universities.clone(),
            user_service,
            cache.clone(),
            sender.clone(),
            AuthConfig {
                jwt_secret: "test-secret".into(),
                access_token_expiration: 900,
                refresh_token_expiration: 3600,
                otp_ttl: 300,
                otp_max_requests: 3,
            },
        );
        Fixture { service, users, universities, cache, sender }
    }

    fn wrong_code(code: &str) -> String {
        if code == "000000" { "111111".into() } else { "000000".into() }
    }

    fn verify(email: &str, otp: &str) -> VerifyOtpModel {
        VerifyOtpModel { email: email.into(), otp: otp.into() }
    }

    fn sign_up_model(email: &str, university_id: Option<Uuid>) -> SignUpModel {
        SignUpModel {
            email: email.into(),
            name: "New Student".into(),
            gender: Gender::Female,
            university_id,
            degree: None,
            year: None,
            bio: None,
        }
    }

    async fn sign_in(f: &Fixture, email: &str) -> TokenPair {
        f.service.request_otp(email).await.unwrap();
        let code = f.sender.code_for(email);
        match f.service.verify_otp(verify(email, &code)).await.unwrap() {
            VerifyOutcome::Existing { tokens, .. } => tokens,
            VerifyOutcome::NewUser => panic!("expected an existing account"),
        }
    }

    #[actix_web::test]
    async fn test_request_otp_limited_per_email() {
        let f = fixture();

        for _ in 0..3 {
            assert!(f.service.request_otp("Student@Campus.edu").await.unwrap());
        }
        let res = f.service.request_otp("student@campus.edu").await;
        assert!(matches!(res, Err(error::SystemError::TooManyRequests(_))));

        // the limit is per address
        assert!(f.service.request_otp("other@campus.edu").await.is_ok());
    }

    #[actix_web::test]
    async fn test_fifth_wrong_attempt_discards_code() {
        let f = fixture();
        let email = "student@campus.edu";
        f.service.request_otp(email).await.unwrap();
        let code = f.sender.code_for(email);
        let wrong = wrong_code(&code);

        for _ in 0..4 {
            let res = f.service.verify_otp(verify(email, &wrong)).await;
            assert!(matches!(res, Err(error::SystemError::Unauthorized(_))));
            assert!(f.cache.contains(&otp_key(email)));
        }

        let res = f.service.verify_otp(verify(email, &wrong)).await;
        assert!(matches!(res, Err(error::SystemError::Unauthorized(_))));
        assert!(!f.cache.contains(&otp_key(email)));

        // the right code no longer works once the record is gone
        let res = f.service.verify_otp(verify(email, &code)).await;
        assert!(matches!(res, Err(error::SystemError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_sign_up_requires_verified_email() {
        let f = fixture();
        let email = "new@campus.edu";

        let res = f.service.sign_up(sign_up_model(email, None)).await;
        assert!(matches!(res, Err(error::SystemError::Unauthorized(_))));

        f.service.request_otp(email).await.unwrap();
        let code = f.sender.code_for(email);
        let outcome = f.service.verify_otp(verify(email, &code)).await.unwrap();
        assert!(matches!(outcome, VerifyOutcome::NewUser));
        assert!(f.cache.contains(&verified_key(email)));

        let (profile, tokens) = f.service.sign_up(sign_up_model(email, None)).await.unwrap();
        assert_eq!(profile.email.as_deref(), Some(email));
        assert!(!tokens.access_token.is_empty());
        assert!(!f.cache.contains(&verified_key(email)));
        assert!(f.users.find_by_email(email).await.unwrap().is_some());

        // the marker is single use
        let again = f.service.sign_up(sign_up_model(email, None)).await;
        assert!(matches!(again, Err(error::SystemError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_sign_up_checks_university_domain() {
        let f = fixture();
        let email = "new@gmail.com";
        let campus = f.universities.insert("Campus", Some("campus.edu"));

        f.cache.set(&verified_key(email), &true, 60).await.unwrap();
        let res = f.service.sign_up(sign_up_model(email, Some(campus))).await;
        assert!(matches!(res, Err(error::SystemError::BadRequest(_))));

        let res = f.service.sign_up(sign_up_model(email, Some(Uuid::now_v7()))).await;
        assert!(matches!(res, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_refresh_rotates_and_revokes_presented_token() {
        let f = fixture();
        let email = "student@campus.edu";
        f.users.insert(email, "Student", Gender::Male);

        let first = sign_in(&f, email).await;
        assert_eq!(f.cache.keys_with_prefix("refresh_token:").len(), 1);

        let second = f.service.refresh(Some(first.refresh_token.clone())).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(f.cache.keys_with_prefix("refresh_token:").len(), 1);

        let replay = f.service.refresh(Some(first.refresh_token)).await;
        assert!(matches!(replay, Err(error::SystemError::Unauthorized(_))));

        let wrong_type = f.service.refresh(Some(second.access_token.clone())).await;
        assert!(matches!(wrong_type, Err(error::SystemError::Unauthorized(_))));

        let missing = f.service.refresh(None).await;
        assert!(matches!(missing, Err(error::SystemError::Unauthorized(_))));

        f.service.logout(Some(second.refresh_token.clone())).await.unwrap();
        let after_logout = f.service.refresh(Some(second.refresh_token)).await;
        assert!(matches!(after_logout, Err(error::SystemError::Unauthorized(_))));
        assert!(f.cache.keys_with_prefix("refresh_token:").is_empty());
    }
}
