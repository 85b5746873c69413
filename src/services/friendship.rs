//! Two-phase friendship state machine.
//!
//! Every friendship is a directed edge with its own status. An edge is confirmed
//! exactly when the opposite edge exists too; adding or removing one side flips
//! the status stored on the other.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{event_feed::EventFeed, users::require_user};
use crate::{
    db::{FriendStore, UserStore},
    error::AppResult,
    models::{EventType, Friendship, FriendshipStatus, Operation, User, UserId},
};

#[derive(Clone)]
pub struct FriendshipService {
    users: Arc<dyn UserStore>,
    friends: Arc<dyn FriendStore>,
    feed: EventFeed,
}

impl FriendshipService {
    pub fn new(users: Arc<dyn UserStore>, friends: Arc<dyn FriendStore>, feed: EventFeed) -> Self {
        Self {
            users,
            friends,
            feed,
        }
    }

    /// Adds or refreshes the edge `user_id -> friend_id`
    pub async fn add_friend(&self, user_id: UserId, friend_id: UserId) -> AppResult<()> {
        require_user(self.users.as_ref(), user_id).await?;
        require_user(self.users.as_ref(), friend_id).await?;

        let status = match self.friends.friendship_status(friend_id, user_id).await? {
            Some(_) => {
                self.friends
                    .update_friendship_status(friend_id, user_id, FriendshipStatus::Confirmed)
                    .await?;
                FriendshipStatus::Confirmed
            }
            None => FriendshipStatus::Unconfirmed,
        };

        let existing = self.friends.friendship_status(user_id, friend_id).await?;
        if existing.is_some() {
            self.friends
                .update_friendship_status(user_id, friend_id, status)
                .await?;
        } else {
            self.friends
                .insert_friendship(user_id, friend_id, status)
                .await?;
        }

        self.feed
            .record_event(user_id, EventType::Friend, Operation::Add, friend_id)
            .await?;

        tracing::info!(user_id, friend_id, status = status.as_str(), "Friend added");
        Ok(())
    }

    /// Deletes the edge `user_id -> friend_id` and un-confirms the opposite one
    pub async fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> AppResult<()> {
        require_user(self.users.as_ref(), user_id).await?;
        require_user(self.users.as_ref(), friend_id).await?;

        if !self.friends.delete_friendship(user_id, friend_id).await? {
            tracing::debug!(user_id, friend_id, "No friendship edge to remove");
        }

        if self
            .friends
            .friendship_status(friend_id, user_id)
            .await?
            .is_some()
        {
            self.friends
                .update_friendship_status(friend_id, user_id, FriendshipStatus::Unconfirmed)
                .await?;
        }

        self.feed
            .record_event(user_id, EventType::Friend, Operation::Remove, friend_id)
            .await?;

        tracing::info!(user_id, friend_id, "Friend removed");
        Ok(())
    }

    /// Users `user_id` has an outgoing edge to, whatever its status
    pub async fn get_friends(&self, user_id: UserId) -> AppResult<Vec<User>> {
        let edges = self.get_friendships(user_id).await?;

        let mut friends = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(friend) = self.users.get_user(edge.friend_id).await? {
                friends.push(friend);
            }
        }
        Ok(friends)
    }

    /// Outgoing edges of `user_id` with their confirmation status
    pub async fn get_friendships(&self, user_id: UserId) -> AppResult<Vec<Friendship>> {
        require_user(self.users.as_ref(), user_id).await?;
        self.friends.friendships_of(user_id).await
    }

    pub async fn get_common_friends(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> AppResult<Vec<User>> {
        let others: BTreeSet<UserId> = self
            .get_friendships(other_id)
            .await?
            .into_iter()
            .map(|edge| edge.friend_id)
            .collect();

        let common = self
            .get_friends(user_id)
            .await?
            .into_iter()
            .filter(|friend| others.contains(&friend.id))
            .collect();
        Ok(common)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{EventStore, MemoryStore},
        error::AppError,
        models::NewUser,
    };

    async fn setup(user_count: usize) -> (Arc<MemoryStore>, FriendshipService, Vec<UserId>) {
        let store = Arc::new(MemoryStore::new());
        let feed = EventFeed::new(store.clone(), store.clone());
        let service = FriendshipService::new(store.clone(), store.clone(), feed);

        let mut ids = Vec::new();
        for n in 0..user_count {
            let user = NewUser {
                email: format!("user{}@example.com", n),
                login: format!("user{}", n),
                name: None,
                birthday: None,
            }
            .into_user();
            ids.push(store.insert_user(user).await.unwrap().id);
        }
        (store, service, ids)
    }

    fn ids(users: &[User]) -> Vec<UserId> {
        users.iter().map(|u| u.id).collect()
    }

    #[tokio::test]
    async fn test_one_sided_friendship_is_unconfirmed() {
        let (store, service, users) = setup(2).await;
        let (a, b) = (users[0], users[1]);

        service.add_friend(a, b).await.unwrap();

        assert_eq!(ids(&service.get_friends(a).await.unwrap()), vec![b]);
        assert!(service.get_friends(b).await.unwrap().is_empty());
        assert_eq!(
            store.friendship_status(a, b).await.unwrap(),
            Some(FriendshipStatus::Unconfirmed)
        );
    }

    #[tokio::test]
    async fn test_mutual_friendship_confirms_both_edges() {
        let (store, service, users) = setup(2).await;
        let (a, b) = (users[0], users[1]);

        service.add_friend(a, b).await.unwrap();
        service.add_friend(b, a).await.unwrap();

        assert_eq!(
            store.friendship_status(a, b).await.unwrap(),
            Some(FriendshipStatus::Confirmed)
        );
        assert_eq!(
            store.friendship_status(b, a).await.unwrap(),
            Some(FriendshipStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_removal_downgrades_reverse_edge() {
        let (store, service, users) = setup(2).await;
        let (a, b) = (users[0], users[1]);
        service.add_friend(a, b).await.unwrap();
        service.add_friend(b, a).await.unwrap();

        service.remove_friend(a, b).await.unwrap();

        assert!(service.get_friends(a).await.unwrap().is_empty());
        assert_eq!(ids(&service.get_friends(b).await.unwrap()), vec![a]);
        assert_eq!(
            store.friendship_status(b, a).await.unwrap(),
            Some(FriendshipStatus::Unconfirmed)
        );
    }

    #[tokio::test]
    async fn test_repeated_add_refreshes_existing_edge() {
        let (_store, service, users) = setup(2).await;
        let (a, b) = (users[0], users[1]);

        service.add_friend(a, b).await.unwrap();
        service.add_friend(a, b).await.unwrap();

        let edges = service.get_friendships(a).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].status, FriendshipStatus::Unconfirmed);
    }

    #[tokio::test]
    async fn test_common_friends() {
        let (_store, service, users) = setup(4).await;
        let (a, b, c, d) = (users[0], users[1], users[2], users[3]);

        service.add_friend(a, c).await.unwrap();
        service.add_friend(a, d).await.unwrap();
        service.add_friend(b, d).await.unwrap();
        service.add_friend(b, c).await.unwrap();
        service.add_friend(b, a).await.unwrap();

        let common = service.get_common_friends(a, b).await.unwrap();
        assert_eq!(ids(&common), vec![c, d]);
    }

    #[tokio::test]
    async fn test_unknown_users_are_not_found() {
        let (_store, service, users) = setup(1).await;

        let result = service.add_friend(users[0], 99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(service.get_friends(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.remove_friend(99, users[0]).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_friend_events_are_recorded() {
        let (store, service, users) = setup(2).await;
        let (a, b) = (users[0], users[1]);

        service.add_friend(a, b).await.unwrap();
        service.remove_friend(a, b).await.unwrap();

        let events = store.events_for_user(a).await.unwrap();
        let ops: Vec<_> = events.iter().map(|e| (e.event_type, e.operation)).collect();
        assert_eq!(
            ops,
            vec![
                (EventType::Friend, Operation::Add),
                (EventType::Friend, Operation::Remove)
            ]
        );
        assert!(events.iter().all(|e| e.entity_id == b));
        assert!(store.events_for_user(b).await.unwrap().is_empty());
    }
}
