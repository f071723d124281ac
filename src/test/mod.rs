//! In-memory repositories backing the service tests.


use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use actix::Actor;
use uuid::Uuid;

use crate::{
    api::error::{self, DbErrorMeta},
    configs::CacheStore,
    modules::{
        connection::{
            repository::{ConnectionRepo, ConnectionRepository},
            schema::{ConnectionEntity, ConnectionRequestEntity, ConnectionStatus, RequestStatus},
        },
        conversation::{
            model::{ConversationRaw, ParticipantRow},
            repository::{ConversationRepo, ConversationRepository, ParticipantRepository},
            schema::{ConversationEntity, ConversationType},
        },
        event::{
            model::{
                AttendeeResponse, BookingOutcome, BookingWithEvent, CreateEventModel,
                EventWithSeats, NewBooking, UpdateEventModel,
            },
            repository::{EventRepo, EventRepository},
            schema::{BookingEntity, BookingStatus, DinnerEventEntity, PaymentStatus},
        },
        explore::{
            model::{CandidateFilter, ExploreCandidate},
            repository::ExploreRepository,
        },
        image::{model::NewImage, repository::ImageRepository, schema::UserImageEntity},
        matching::{
            model::{ConnectOutcome, SelectionOutcome},
            repository::{MatchingRepo, MatchingRepository},
            schema::{AdjectiveSelectionEntity, MatchEntity},
        },
        message::{
            model::InsertMessage,
            repository::{MessageRepo, MessageRepository},
            schema::MessageEntity,
        },
        university::{repository::UniversityRepository, schema::UniversityEntity},
        user::{
            model::{InsertUser, UpdateUser, UserSummary},
            repository::UserRepository,
            schema::{Gender, UserEntity, UserRole},
        },
        websocket::{notifier::Notifier, server::WebSocketServer},
    },
    utils::normalize_pair,
};

type Now = chrono::DateTime<chrono::Utc>;

fn now() -> Now {
    chrono::Utc::now()
}

pub fn test_notifier() -> Notifier {
    Notifier::new(WebSocketServer::default().start())
}

// ---------------------------------------------------------------------------
// cache

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.get(key).is_some_and(|(_, expires)| *expires > Instant::now())
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        entries.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, error::SystemError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, expires)) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        expiration: usize,
    ) -> Result<(), error::SystemError> {
        let expires = Instant::now() + Duration::from_secs(expiration as u64);
        self.entries.lock().unwrap().insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn incr_with_ttl(&self, key: &str, window: u64) -> Result<u64, error::SystemError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let entry = entries
            .entry(key.to_string())
            .and_modify(|(value, expires)| {
                if *expires <= now {
                    *value = b"0".to_vec();
                    *expires = now + Duration::from_secs(window);
                }
            })
            .or_insert_with(|| (b"0".to_vec(), now + Duration::from_secs(window)));

        let count = String::from_utf8_lossy(&entry.0).parse::<u64>().unwrap_or(0) + 1;
        entry.0 = count.to_string().into_bytes();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// universities

#[derive(Default)]
pub struct InMemoryUniversityRepository {
    universities: Mutex<Vec<UniversityEntity>>,
}

impl InMemoryUniversityRepository {
    pub fn insert(&self, name: &str, email_domain: Option<&str>) -> Uuid {
        let id = Uuid::now_v7();
        self.universities.lock().unwrap().push(UniversityEntity {
            id,
            name: name.to_string(),
            country: "India".to_string(),
            city: None,
            email_domain: email_domain.map(str::to_string),
            created_at: now(),
        });
        id
    }
}

#[async_trait::async_trait]
impl UniversityRepository for InMemoryUniversityRepository {
    async fn find_all(&self) -> Result<Vec<UniversityEntity>, error::SystemError> {
        Ok(self.universities.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UniversityEntity>, error::SystemError> {
        Ok(self.universities.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }
}

// ---------------------------------------------------------------------------
// users

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, UserEntity>>,
}

impl InMemoryUserRepository {
    pub fn insert(&self, email: &str, name: &str, gender: Gender) -> Uuid {
        let id = Uuid::now_v7();
        let user = UserEntity {
            id,
            email: email.to_string(),
            name: name.to_string(),
            gender,
            bio: None,
            university_id: None,
            degree: None,
            year: None,
            interests: vec![],
            role: UserRole::User,
            deleted_at: None,
            created_at: now(),
            updated_at: now(),
        };
        self.users.lock().unwrap().insert(id, user);
        id
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id))
            .filter(|u| u.deleted_at.is_none())
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                gender: u.gender,
                university_name: None,
                degree: u.degree.clone(),
                year: u.year,
                avatar_url: None,
            })
            .collect())
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(error::SystemError::UniqueViolation(None));
        }
        let id = self.insert(&user.email, &user.name, user.gender);
        let mut users = self.users.lock().unwrap();
        let entity = users.get_mut(&id).ok_or_else(|| error::SystemError::not_found("User not found"))?;
        entity.bio = user.bio.clone();
        entity.university_id = user.university_id;
        entity.degree = user.degree.clone();
        entity.year = user.year;
        Ok(entity.clone())
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let entity = users
            .get_mut(id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(name) = &user.name {
            entity.name = name.clone();
        }
        if let Some(gender) = user.gender {
            entity.gender = gender;
        }
        if let Some(bio) = &user.bio {
            entity.bio = bio.clone();
        }
        if let Some(university_id) = user.university_id {
            entity.university_id = university_id;
        }
        if let Some(degree) = &user.degree {
            entity.degree = degree.clone();
        }
        if let Some(year) = user.year {
            entity.year = year;
        }
        if let Some(interests) = &user.interests {
            entity.interests = interests.clone();
        }
        entity.updated_at = now();
        Ok(entity.clone())
    }

    async fn delete_cascade(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(id) {
            Some(u) if u.deleted_at.is_none() => {
                u.deleted_at = Some(now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// images

#[derive(Default)]
pub struct InMemoryImageRepository {
    images: Mutex<Vec<UserImageEntity>>,
}

#[async_trait::async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<UserImageEntity>, error::SystemError> {
        self.find_by_users(&[*user_id]).await
    }

    async fn find_by_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserImageEntity>, error::SystemError> {
        let images = self.images.lock().unwrap();
        let mut found: Vec<UserImageEntity> =
            images.iter().filter(|i| user_ids.contains(&i.user_id)).cloned().collect();
        found.sort_by_key(|i| (i.user_id, i.slot));
        Ok(found)
    }

    async fn upsert(
        &self,
        image: &NewImage,
    ) -> Result<(UserImageEntity, Option<String>), error::SystemError> {
        let mut images = self.images.lock().unwrap();
        let previous = images
            .iter()
            .position(|i| i.user_id == image.user_id && i.slot == image.slot)
            .map(|idx| images.remove(idx).storage_path);

        let entity = UserImageEntity {
            user_id: image.user_id,
            slot: image.slot,
            url: image.url.clone(),
            storage_path: image.storage_path.clone(),
            mime_type: image.mime_type.clone(),
            created_at: now(),
        };
        images.push(entity.clone());
        Ok((entity, previous))
    }

    async fn delete_slot(
        &self,
        user_id: &Uuid,
        slot: i16,
    ) -> Result<Option<UserImageEntity>, error::SystemError> {
        let mut images = self.images.lock().unwrap();
        let idx = images.iter().position(|i| i.user_id == *user_id && i.slot == slot);
        Ok(idx.map(|idx| images.remove(idx)))
    }
}

// ---------------------------------------------------------------------------
// connections

#[derive(Default)]
pub struct InMemoryConnectionRepository {
    connections: Mutex<HashMap<(Uuid, Uuid), ConnectionEntity>>,
    requests: Mutex<Vec<ConnectionRequestEntity>>,
}

impl InMemoryConnectionRepository {
    /// Stores a row for the pair with `a` as the acting user.
    pub fn set(&self, a: Uuid, b: Uuid, status: ConnectionStatus) {
        let (u1, u2) = normalize_pair(a, b);
        let row = ConnectionEntity {
            user_id_1: u1,
            user_id_2: u2,
            status,
            action_user_id: a,
            created_at: now(),
            updated_at: now(),
        };
        self.connections.lock().unwrap().insert((u1, u2), row);
    }

    pub fn has_row(&self, a: Uuid, b: Uuid) -> bool {
        self.connections.lock().unwrap().contains_key(&normalize_pair(a, b))
    }

    fn between(r: &ConnectionRequestEntity, a: &Uuid, b: &Uuid) -> bool {
        (r.requester_id == *a && r.target_id == *b) || (r.requester_id == *b && r.target_id == *a)
    }
}

#[async_trait::async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn find_connection(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        let connections = self.connections.lock().unwrap();
        Ok(connections.get(&normalize_pair(*user_a, *user_b)).cloned())
    }

    async fn find_relations(&self, user_id: &Uuid) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let connections = self.connections.lock().unwrap();
        Ok(connections
            .values()
            .filter(|c| c.user_id_1 == *user_id || c.user_id_2 == *user_id)
            .cloned()
            .collect())
    }

    async fn find_connected(&self, user_id: &Uuid) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let mut rows: Vec<ConnectionEntity> = self
            .find_relations(user_id)
            .await?
            .into_iter()
            .filter(|c| c.status == ConnectionStatus::Connected)
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn find_pending_request(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<Option<ConnectionRequestEntity>, error::SystemError> {
        let requests = self.requests.lock().unwrap();
        Ok(requests
            .iter()
            .find(|r| {
                r.requester_id == *requester_id
                    && r.target_id == *target_id
                    && r.status == RequestStatus::Pending
            })
            .cloned())
    }

    async fn find_incoming_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError> {
        let requests = self.requests.lock().unwrap();
        Ok(requests
            .iter()
            .rev()
            .filter(|r| r.target_id == *user_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect())
    }

    async fn find_outgoing_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError> {
        let requests = self.requests.lock().unwrap();
        Ok(requests
            .iter()
            .rev()
            .filter(|r| r.requester_id == *user_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl ConnectionRepo for InMemoryConnectionRepository {
    async fn create_request_atomic(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionRequestEntity, error::SystemError> {
        if self.has_row(*requester_id, *target_id) {
            return Err(error::SystemError::UniqueViolation(None));
        }
        self.set(*requester_id, *target_id, ConnectionStatus::Requested);

        let request = ConnectionRequestEntity {
            id: Uuid::now_v7(),
            requester_id: *requester_id,
            target_id: *target_id,
            status: RequestStatus::Pending,
            created_at: now(),
            updated_at: now(),
        };
        self.requests.lock().unwrap().push(request.clone());
        Ok(request)
    }

    async fn accept_request_atomic(
        &self,
        accepter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        {
            let mut requests = self.requests.lock().unwrap();
            let Some(request) = requests.iter_mut().find(|r| {
                r.requester_id == *requester_id
                    && r.target_id == *accepter_id
                    && r.status == RequestStatus::Pending
            }) else {
                return Ok(None);
            };
            request.status = RequestStatus::Accepted;
        }

        let mut connections = self.connections.lock().unwrap();
        let (u1, u2) = normalize_pair(*accepter_id, *requester_id);
        let row = connections.entry((u1, u2)).or_insert_with(|| ConnectionEntity {
            user_id_1: u1,
            user_id_2: u2,
            status: ConnectionStatus::Requested,
            action_user_id: *requester_id,
            created_at: now(),
            updated_at: now(),
        });
        if row.status == ConnectionStatus::Blocked {
            return Err(error::SystemError::conflict("Connection is blocked"));
        }
        row.status = ConnectionStatus::Connected;
        row.action_user_id = *accepter_id;
        row.updated_at = now();
        Ok(Some(row.clone()))
    }

    async fn reject_request_atomic(
        &self,
        rejecter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        {
            let mut requests = self.requests.lock().unwrap();
            let Some(request) = requests.iter_mut().find(|r| {
                r.requester_id == *requester_id
                    && r.target_id == *rejecter_id
                    && r.status == RequestStatus::Pending
            }) else {
                return Ok(false);
            };
            request.status = RequestStatus::Rejected;
        }

        let mut connections = self.connections.lock().unwrap();
        let key = normalize_pair(*rejecter_id, *requester_id);
        if connections.get(&key).is_some_and(|c| c.status == ConnectionStatus::Requested) {
            connections.remove(&key);
        }
        Ok(true)
    }

    async fn remove_connection_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let mut connections = self.connections.lock().unwrap();
        let key = normalize_pair(*user_id, *other_id);
        match connections.get(&key) {
            Some(c) if c.status != ConnectionStatus::Blocked => {
                connections.remove(&key);
            }
            _ => return Ok(false),
        }
        self.requests.lock().unwrap().retain(|r| !Self::between(r, user_id, other_id));
        Ok(true)
    }

    async fn block_atomic(
        &self,
        blocker_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionEntity, error::SystemError> {
        self.set(*blocker_id, *target_id, ConnectionStatus::Blocked);
        self.requests
            .lock()
            .unwrap()
            .retain(|r| r.status != RequestStatus::Pending || !Self::between(r, blocker_id, target_id));
        self.find_connection(blocker_id, target_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Connection not found"))
    }

    async fn unblock(&self, blocker_id: &Uuid, target_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut connections = self.connections.lock().unwrap();
        let key = normalize_pair(*blocker_id, *target_id);
        let owned = connections
            .get(&key)
            .is_some_and(|c| c.status == ConnectionStatus::Blocked && c.action_user_id == *blocker_id);
        if owned {
            connections.remove(&key);
        }
        Ok(owned)
    }
}

// ---------------------------------------------------------------------------
// matching

#[derive(Default)]
pub struct InMemoryMatchingRepository {
    selections: Mutex<HashMap<(Uuid, Uuid), AdjectiveSelectionEntity>>,
    matches: Mutex<HashMap<(Uuid, Uuid), MatchEntity>>,
    connected: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl InMemoryMatchingRepository {
    pub fn match_count(&self) -> usize {
        self.matches.lock().unwrap().len()
    }

    pub fn find(&self, a: Uuid, b: Uuid) -> Option<MatchEntity> {
        self.matches.lock().unwrap().get(&normalize_pair(a, b)).cloned()
    }

    /// Stands in for a `connected` row in the connections table.
    pub fn connect_pair(&self, a: Uuid, b: Uuid) {
        self.connected.lock().unwrap().insert(normalize_pair(a, b));
    }
}

#[async_trait::async_trait]
impl MatchingRepository for InMemoryMatchingRepository {
    async fn find_selection(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
    ) -> Result<Option<AdjectiveSelectionEntity>, error::SystemError> {
        let selections = self.selections.lock().unwrap();
        Ok(selections.get(&(*user_id, *target_user_id)).cloned())
    }

    async fn find_matches(&self, user_id: &Uuid) -> Result<Vec<MatchEntity>, error::SystemError> {
        let matches = self.matches.lock().unwrap();
        let mut found: Vec<MatchEntity> = matches
            .values()
            .filter(|m| m.user_id_1 == *user_id || m.user_id_2 == *user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
        Ok(found)
    }
}

#[async_trait::async_trait]
impl MatchingRepo for InMemoryMatchingRepository {
    async fn select_adjective_atomic(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
        adjective: &str,
        ice_breaking_prompt: &str,
    ) -> Result<SelectionOutcome, error::SystemError> {
        let mut selections = self.selections.lock().unwrap();
        selections.insert(
            (*user_id, *target_user_id),
            AdjectiveSelectionEntity {
                user_id: *user_id,
                target_user_id: *target_user_id,
                adjective: adjective.to_string(),
                is_matched: false,
                selected_at: now(),
            },
        );

        let reciprocal = selections
            .get(&(*target_user_id, *user_id))
            .is_some_and(|s| s.adjective == adjective);

        if !reciprocal {
            return Ok(SelectionOutcome::Pending);
        }

        let pair = normalize_pair(*user_id, *target_user_id);
        let mut matches = self.matches.lock().unwrap();
        let outcome = match matches.get_mut(&pair) {
            Some(found) if found.mutual_adjective == adjective => {
                SelectionOutcome::ExistingMatch(found.clone())
            }
            Some(found) => {
                found.mutual_adjective = adjective.to_string();
                found.ice_breaking_prompt = Some(ice_breaking_prompt.to_string());
                found.matched_at = now();
                SelectionOutcome::NewMatch(found.clone())
            }
            None => {
                let created = MatchEntity {
                    id: Uuid::now_v7(),
                    user_id_1: pair.0,
                    user_id_2: pair.1,
                    mutual_adjective: adjective.to_string(),
                    is_connected: self.connected.lock().unwrap().contains(&pair),
                    ice_breaking_prompt: Some(ice_breaking_prompt.to_string()),
                    matched_at: now(),
                };
                matches.insert(pair, created.clone());
                SelectionOutcome::NewMatch(created)
            }
        };

        for key in [(*user_id, *target_user_id), (*target_user_id, *user_id)] {
            if let Some(selection) = selections.get_mut(&key) {
                selection.is_matched = true;
            }
        }

        Ok(outcome)
    }

    async fn connect_after_match_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<ConnectOutcome, error::SystemError> {
        let pair = normalize_pair(*user_id, *other_id);
        let mut matches = self.matches.lock().unwrap();
        let Some(found) = matches.get_mut(&pair) else {
            return Ok(ConnectOutcome::NoMatch);
        };
        if found.is_connected {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let newly = self.connected.lock().unwrap().insert(pair);
        found.is_connected = true;
        if !newly {
            return Ok(ConnectOutcome::AlreadyConnected);
        }
        Ok(ConnectOutcome::Connected(found.clone()))
    }
}

// ---------------------------------------------------------------------------
// explore

#[derive(Default)]
pub struct InMemoryExploreRepository {
    candidates: Mutex<Vec<ExploreCandidate>>,
}

impl InMemoryExploreRepository {
    pub fn insert(&self, candidate: ExploreCandidate) -> Uuid {
        let id = candidate.id;
        self.candidates.lock().unwrap().push(candidate);
        id
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

#[async_trait::async_trait]
impl ExploreRepository for InMemoryExploreRepository {
    async fn find_candidates(
        &self,
        viewer_id: &Uuid,
        filter: &CandidateFilter,
        cap: i64,
    ) -> Result<Vec<ExploreCandidate>, error::SystemError> {
        let candidates = self.candidates.lock().unwrap();
        Ok(candidates
            .iter()
            .filter(|c| c.id != *viewer_id)
            .filter(|c| filter.gender.is_none_or(|g| c.gender == g))
            .filter(|c| filter.university_id.is_none_or(|u| c.university_id == Some(u)))
            .filter(|c| filter.year.is_none_or(|y| c.year == Some(y)))
            .filter(|c| filter.degree.as_deref().is_none_or(|d| contains_ci(c.degree.as_deref(), d)))
            .filter(|c| {
                filter.search.as_deref().is_none_or(|s| {
                    contains_ci(Some(&c.name), s) || contains_ci(c.degree.as_deref(), s)
                })
            })
            .take(cap.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_candidate(&self, id: &Uuid) -> Result<Option<ExploreCandidate>, error::SystemError> {
        let candidates = self.candidates.lock().unwrap();
        Ok(candidates.iter().find(|c| c.id == *id).cloned())
    }
}

// ---------------------------------------------------------------------------
// conversations and messages

struct StoredConversation {
    entity: ConversationEntity,
    group_name: Option<String>,
    created_by: Option<Uuid>,
}

struct StoredParticipant {
    conversation_id: Uuid,
    user_id: Uuid,
    unread_count: i32,
    joined_at: Now,
    active: bool,
}

#[derive(Default)]
struct ChatState {
    conversations: Vec<StoredConversation>,
    participants: Vec<StoredParticipant>,
    messages: Vec<MessageEntity>,
}

impl ChatState {
    fn create(&mut self, kind: ConversationType, name: Option<&str>, created_by: Option<Uuid>, members: &[Uuid]) -> ConversationEntity {
        let entity = ConversationEntity { id: Uuid::now_v7(), _type: kind, created_at: now(), updated_at: now() };
        self.conversations.push(StoredConversation {
            entity: entity.clone(),
            group_name: name.map(str::to_string),
            created_by,
        });
        for user_id in members {
            self.participants.push(StoredParticipant {
                conversation_id: entity.id,
                user_id: *user_id,
                unread_count: 0,
                joined_at: now(),
                active: true,
            });
        }
        entity
    }

    fn participant(&mut self, conversation_id: &Uuid, user_id: &Uuid) -> Option<&mut StoredParticipant> {
        self.participants
            .iter_mut()
            .find(|p| p.conversation_id == *conversation_id && p.user_id == *user_id && p.active)
    }
}

/// Conversations, participants and messages sharing one store, like the tables do.
#[derive(Default)]
pub struct InMemoryChatStore {
    state: Mutex<ChatState>,
}

impl InMemoryChatStore {
    pub fn add_conversation(&self, members: &[Uuid]) -> Uuid {
        let mut state = self.state.lock().unwrap();
        state.create(ConversationType::Group, Some("Test group"), members.first().copied(), members).id
    }

    pub fn unread(&self, conversation_id: Uuid, user_id: Uuid) -> i32 {
        let mut state = self.state.lock().unwrap();
        state.participant(&conversation_id, &user_id).map_or(0, |p| p.unread_count)
    }

    /// Inserts a message `offset` seconds after a fixed point in the past.
    pub fn push_message(&self, conversation_id: Uuid, sender_id: Uuid, content: &str, offset: i64) {
        let created_at = now() - chrono::Duration::hours(1) + chrono::Duration::seconds(offset);
        self.state.lock().unwrap().messages.push(MessageEntity {
            id: Uuid::now_v7(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            deleted_at: None,
            created_at,
            updated_at: created_at,
        });
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryChatStore {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.entity.id == *conversation_id)
            .map(|c| c.entity.clone()))
    }

    async fn find_for_user(
        &self,
        user_id: &Uuid,
        only: Option<&Uuid>,
    ) -> Result<Vec<ConversationRaw>, error::SystemError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<ConversationRaw> = state
            .participants
            .iter()
            .filter(|p| p.user_id == *user_id && p.active)
            .filter(|p| only.is_none_or(|id| p.conversation_id == *id))
            .filter_map(|p| {
                let c = state.conversations.iter().find(|c| c.entity.id == p.conversation_id)?;
                let last = state
                    .messages
                    .iter()
                    .filter(|m| m.conversation_id == c.entity.id && m.deleted_at.is_none())
                    .max_by_key(|m| m.created_at);

                Some(ConversationRaw {
                    id: c.entity.id,
                    _type: c.entity._type,
                    created_at: c.entity.created_at,
                    updated_at: c.entity.updated_at,
                    group_name: c.group_name.clone(),
                    group_created_by: c.created_by,
                    group_avatar_url: None,
                    last_id: last.map(|m| m.id),
                    last_content: last.map(|m| m.content.clone()),
                    last_sender_id: last.map(|m| m.sender_id),
                    last_created_at: last.map(|m| m.created_at),
                    unread_count: p.unread_count,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ConversationRepo for InMemoryChatStore {
    async fn create_direct_atomic(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<(ConversationEntity, bool), error::SystemError> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .conversations
            .iter()
            .filter(|c| c.entity._type == ConversationType::Direct)
            .find(|c| {
                let member =
                    |u: &Uuid| state.participants.iter().any(|p| p.conversation_id == c.entity.id && p.user_id == *u);
                member(user_a) && member(user_b)
            })
            .map(|c| c.entity.clone());

        if let Some(entity) = existing {
            return Ok((entity, false));
        }
        Ok((state.create(ConversationType::Direct, None, None, &[*user_a, *user_b]), true))
    }

    async fn create_group_atomic(
        &self,
        name: &str,
        created_by: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ConversationEntity, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.create(ConversationType::Group, Some(name), Some(*created_by), member_ids))
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for InMemoryChatStore {
    async fn is_member(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.participant(conversation_id, user_id).is_some())
    }

    async fn find_by_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> Result<Vec<ParticipantRow>, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.active && conversation_ids.contains(&p.conversation_id))
            .map(|p| ParticipantRow {
                conversation_id: p.conversation_id,
                user_id: p.user_id,
                name: format!("user-{}", &p.user_id.simple().to_string()[..8]),
                avatar_url: None,
                unread_count: p.unread_count,
                joined_at: p.joined_at,
            })
            .collect())
    }

    async fn member_ids(&self, conversation_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.active && p.conversation_id == *conversation_id)
            .map(|p| p.user_id)
            .collect())
    }

    async fn reset_unread(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.participant(conversation_id, user_id).map(|p| p.unread_count = 0).is_some())
    }

    async fn leave(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.participant(conversation_id, user_id).map(|p| p.active = false).is_some())
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryChatStore {
    async fn find_by_id(&self, message_id: &Uuid) -> Result<Option<MessageEntity>, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .find(|m| m.id == *message_id && m.deleted_at.is_none())
            .cloned())
    }

    async fn find_page(
        &self,
        conversation_id: &Uuid,
        before: Option<Now>,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let state = self.state.lock().unwrap();
        let mut page: Vec<MessageEntity> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id && m.deleted_at.is_none())
            .filter(|m| before.is_none_or(|b| m.created_at < b))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        page.truncate(limit.max(0) as usize);
        Ok(page)
    }
}

#[async_trait::async_trait]
impl MessageRepo for InMemoryChatStore {
    async fn create_atomic(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        let entity = MessageEntity {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            deleted_at: None,
            created_at: now(),
            updated_at: now(),
        };

        for p in state.participants.iter_mut() {
            if p.conversation_id == message.conversation_id && p.active && p.user_id != message.sender_id {
                p.unread_count += 1;
            }
        }
        if let Some(c) = state.conversations.iter_mut().find(|c| c.entity.id == message.conversation_id) {
            c.entity.updated_at = entity.created_at;
        }
        state.messages.push(entity.clone());
        Ok(entity)
    }

    async fn soft_delete(&self, message_id: &Uuid, sender_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .messages
            .iter_mut()
            .find(|m| m.id == *message_id && m.sender_id == *sender_id && m.deleted_at.is_none());
        Ok(found.map(|m| m.deleted_at = Some(now())).is_some())
    }
}

// ---------------------------------------------------------------------------
// dinner events

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<HashMap<Uuid, DinnerEventEntity>>,
    bookings: Mutex<Vec<BookingEntity>>,
    collide_transaction: AtomicBool,
}

impl InMemoryEventRepository {
    /// The next booking insert fails as if its transaction id were already taken.
    pub fn collide_next_transaction(&self) {
        self.collide_transaction.store(true, Ordering::SeqCst);
    }

    /// An active event in "Mumbai" starting `starts_in` from now.
    pub fn insert_event(&self, price: i64, capacity: i32, starts_in: chrono::Duration) -> Uuid {
        let id = Uuid::now_v7();
        let event = DinnerEventEntity {
            id,
            title: "Supper club".to_string(),
            description: None,
            venue: "Rooftop".to_string(),
            city: "Mumbai".to_string(),
            event_date: now() + starts_in,
            price,
            capacity,
            is_active: true,
            created_by: Uuid::now_v7(),
            created_at: now(),
            updated_at: now(),
        };
        self.events.lock().unwrap().insert(id, event);
        id
    }

    fn booked_seats(&self, event_id: &Uuid) -> i64 {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.event_id == *event_id && b.booking_status == BookingStatus::Confirmed)
            .map(|b| i64::from(b.seats))
            .sum()
    }

    fn with_seats(&self, event: DinnerEventEntity) -> EventWithSeats {
        let booked_seats = self.booked_seats(&event.id);
        EventWithSeats { event, booked_seats }
    }
}

#[async_trait::async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_events(
        &self,
        city: Option<&str>,
        upcoming_only: bool,
    ) -> Result<Vec<EventWithSeats>, error::SystemError> {
        let mut events: Vec<DinnerEventEntity> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.is_active)
            .filter(|e| city.is_none_or(|c| e.city.eq_ignore_ascii_case(c)))
            .filter(|e| !upcoming_only || e.event_date > now())
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_date);
        Ok(events.into_iter().map(|e| self.with_seats(e)).collect())
    }

    async fn find_event(&self, id: &Uuid) -> Result<Option<EventWithSeats>, error::SystemError> {
        let event = self.events.lock().unwrap().get(id).cloned();
        Ok(event.map(|e| self.with_seats(e)))
    }

    async fn create_event(
        &self,
        created_by: &Uuid,
        event: &CreateEventModel,
    ) -> Result<DinnerEventEntity, error::SystemError> {
        let entity = DinnerEventEntity {
            id: Uuid::now_v7(),
            title: event.title.clone(),
            description: event.description.clone(),
            venue: event.venue.clone(),
            city: event.city.clone(),
            event_date: event.event_date,
            price: event.price,
            capacity: event.capacity,
            is_active: true,
            created_by: *created_by,
            created_at: now(),
            updated_at: now(),
        };
        self.events.lock().unwrap().insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update_event(
        &self,
        id: &Uuid,
        event: &UpdateEventModel,
    ) -> Result<Option<DinnerEventEntity>, error::SystemError> {
        let mut events = self.events.lock().unwrap();
        let Some(entity) = events.get_mut(id) else {
            return Ok(None);
        };
        if let Some(v) = &event.title {
            entity.title = v.clone();
        }
        if let Some(v) = &event.description {
            entity.description = Some(v.clone());
        }
        if let Some(v) = &event.venue {
            entity.venue = v.clone();
        }
        if let Some(v) = &event.city {
            entity.city = v.clone();
        }
        if let Some(v) = event.event_date {
            entity.event_date = v;
        }
        if let Some(v) = event.price {
            entity.price = v;
        }
        if let Some(v) = event.capacity {
            entity.capacity = v;
        }
        if let Some(v) = event.is_active {
            entity.is_active = v;
        }
        entity.updated_at = now();
        Ok(Some(entity.clone()))
    }

    async fn find_booking(&self, id: &Uuid) -> Result<Option<BookingEntity>, error::SystemError> {
        Ok(self.bookings.lock().unwrap().iter().find(|b| b.id == *id).cloned())
    }

    async fn find_booking_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings.iter().find(|b| b.transaction_id == transaction_id).cloned())
    }

    async fn find_active_booking(
        &self,
        event_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .find(|b| {
                b.event_id == *event_id
                    && b.user_id == *user_id
                    && b.booking_status == BookingStatus::Confirmed
            })
            .cloned())
    }

    async fn find_user_bookings(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<BookingWithEvent>, error::SystemError> {
        let events = self.events.lock().unwrap();
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .filter(|b| b.user_id == *user_id)
            .filter_map(|b| {
                let e = events.get(&b.event_id)?;
                Some(BookingWithEvent {
                    booking: b.clone(),
                    event_title: e.title.clone(),
                    event_venue: e.venue.clone(),
                    event_city: e.city.clone(),
                    event_date: e.event_date,
                })
            })
            .collect())
    }

    async fn find_attendees(
        &self,
        event_id: &Uuid,
    ) -> Result<Vec<AttendeeResponse>, error::SystemError> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .filter(|b| b.event_id == *event_id && b.booking_status == BookingStatus::Confirmed)
            .map(|b| AttendeeResponse {
                user_id: b.user_id,
                name: "Guest".to_string(),
                gender: Gender::Other,
                university_name: None,
                avatar_url: None,
                seats: b.seats,
                booked_at: b.created_at,
            })
            .collect())
    }

    async fn update_payment(
        &self,
        booking_id: &Uuid,
        status: PaymentStatus,
        gateway_payment_id: Option<&str>,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let mut bookings = self.bookings.lock().unwrap();
        let Some(booking) = bookings.iter_mut().find(|b| b.id == *booking_id) else {
            return Ok(None);
        };
        booking.payment_status = status;
        if let Some(id) = gateway_payment_id {
            booking.gateway_payment_id = Some(id.to_string());
        }
        booking.updated_at = now();
        Ok(Some(booking.clone()))
    }

    async fn cancel_booking(
        &self,
        booking_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<BookingEntity>, error::SystemError> {
        let events = self.events.lock().unwrap();
        let mut bookings = self.bookings.lock().unwrap();
        let Some(booking) = bookings.iter_mut().find(|b| {
            b.id == *booking_id && b.user_id == *user_id && b.booking_status == BookingStatus::Confirmed
        }) else {
            return Ok(None);
        };
        if events.get(&booking.event_id).is_none_or(|e| e.event_date <= now()) {
            return Ok(None);
        }

        booking.booking_status = BookingStatus::Cancelled;
        if booking.payment_status == PaymentStatus::Completed {
            booking.payment_status = PaymentStatus::Refunded;
        }
        booking.updated_at = now();
        Ok(Some(booking.clone()))
    }
}

#[async_trait::async_trait]
impl EventRepo for InMemoryEventRepository {
    async fn create_booking_atomic(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingOutcome, error::SystemError> {
        let Some(event) = self.events.lock().unwrap().get(&booking.event_id).cloned() else {
            return Ok(BookingOutcome::EventNotFound);
        };
        if !event.is_open_for_booking(now()) {
            return Ok(BookingOutcome::Closed);
        }
        if self.collide_transaction.swap(false, Ordering::SeqCst) {
            return Err(error::SystemError::UniqueViolation(Some(DbErrorMeta {
                constraint: Some("bookings_transaction_key".into()),
            })));
        }
        if self.find_active_booking(&booking.event_id, &booking.user_id).await?.is_some() {
            return Ok(BookingOutcome::AlreadyBooked);
        }

        let seats_left = (i64::from(event.capacity) - self.booked_seats(&event.id)).max(0);
        if i64::from(booking.seats) > seats_left {
            return Ok(BookingOutcome::SoldOut { seats_left });
        }

        let created = BookingEntity {
            id: Uuid::now_v7(),
            event_id: booking.event_id,
            user_id: booking.user_id,
            seats: booking.seats,
            amount: event.price * i64::from(booking.seats),
            payment_gateway: booking.payment_gateway,
            payment_status: booking.payment_status,
            booking_status: BookingStatus::Confirmed,
            transaction_id: booking.transaction_id.clone(),
            gateway_order_id: booking.gateway_order_id.clone(),
            gateway_payment_id: booking.gateway_payment_id.clone(),
            created_at: now(),
            updated_at: now(),
        };
        self.bookings.lock().unwrap().push(created.clone());
        Ok(BookingOutcome::Created(created))
    }
}
