use std::collections::HashMap;

use super::traits::MemberResolver;
use super::{Member, MemberId, StoreError};

/// [`MemberResolver`] backed by a fixed in-process map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberResolver {
    members: HashMap<MemberId, Member>,
}

impl InMemoryMemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, id: MemberId, name: &str) -> Self {
        self.insert(Member {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn insert(&mut self, member: Member) {
        self.members.insert(member.id, member);
    }
}

impl MemberResolver for InMemoryMemberResolver {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        Ok(self.members.get(&id).cloned())
    }
}
