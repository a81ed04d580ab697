//! Database schema definitions and constants.

// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

// Table names
pub const TABLE_SCHEMA_MIGRATIONS: &str = "schema_migrations";
pub const TABLE_USERS: &str = "users";
pub const TABLE_TEAMS: &str = "teams";
pub const TABLE_TEAM_MEMBERS: &str = "team_members";
pub const TABLE_TEAM_INVITATIONS: &str = "team_invitations";
pub const TABLE_SNIPPETS: &str = "snippets";
pub const TABLE_SNIPPET_VERSIONS: &str = "snippet_versions";
pub const TABLE_TAGS: &str = "tags";
pub const TABLE_SNIPPET_TAGS: &str = "snippet_tags";
pub const TABLE_SHARES: &str = "shares";
pub const TABLE_FAVORITES: &str = "favorites";
pub const TABLE_FOLLOWS: &str = "follows";
pub const TABLE_COMMENTS: &str = "comments";
pub const TABLE_COLLECTIONS: &str = "collections";
pub const TABLE_COLLECTION_SNIPPETS: &str = "collection_snippets";
pub const TABLE_NOTIFICATIONS: &str = "notifications";
pub const TABLE_AUDIT_LOGS: &str = "audit_logs";
pub const TABLE_SNIPPET_VIEWS: &str = "snippet_views";

// Column names for users table
pub mod users {
    pub const ID: &str = "id";
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const DISPLAY_NAME: &str = "display_name";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for teams table
pub mod teams {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const SLUG: &str = "slug";
    pub const OWNER_ID: &str = "owner_id";
    pub const PRIVACY: &str = "privacy";
    pub const DESCRIPTION: &str = "description";
    pub const MEMBER_COUNT: &str = "member_count";
    pub const SNIPPET_COUNT: &str = "snippet_count";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const DELETED_AT: &str = "deleted_at";
}

// Column names for team_members table
pub mod team_members {
    pub const ID: &str = "id";
    pub const TEAM_ID: &str = "team_id";
    pub const USER_ID: &str = "user_id";
    pub const ROLE: &str = "role";
    pub const CAN_CREATE_SNIPPETS: &str = "can_create_snippets";
    pub const CAN_EDIT_SNIPPETS: &str = "can_edit_snippets";
    pub const CAN_DELETE_SNIPPETS: &str = "can_delete_snippets";
    pub const CAN_MANAGE_MEMBERS: &str = "can_manage_members";
    pub const CAN_INVITE_MEMBERS: &str = "can_invite_members";
    pub const JOINED_AT: &str = "joined_at";
}

// Column names for team_invitations table
pub mod team_invitations {
    pub const ID: &str = "id";
    pub const TEAM_ID: &str = "team_id";
    pub const EMAIL: &str = "email";
    pub const INVITER_ID: &str = "inviter_id";
    pub const ROLE: &str = "role";
    pub const TOKEN: &str = "token";
    pub const STATUS: &str = "status";
    pub const EXPIRES_AT: &str = "expires_at";
    pub const ACCEPTED_AT: &str = "accepted_at";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for snippets table
pub mod snippets {
    pub const ID: &str = "id";
    pub const OWNER_ID: &str = "owner_id";
    pub const TEAM_ID: &str = "team_id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const LANGUAGE: &str = "language";
    pub const CODE: &str = "code";
    pub const PRIVACY: &str = "privacy";
    pub const VERSION_NUMBER: &str = "version_number";
    pub const PARENT_ID: &str = "parent_id";
    pub const VIEW_COUNT: &str = "view_count";
    pub const UNIQUE_VIEW_COUNT: &str = "unique_view_count";
    pub const FORK_COUNT: &str = "fork_count";
    pub const FAVORITE_COUNT: &str = "favorite_count";
    pub const COMMENT_COUNT: &str = "comment_count";
    pub const SHARE_COUNT: &str = "share_count";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const DELETED_AT: &str = "deleted_at";
}

// Column names for snippet_versions table
pub mod snippet_versions {
    pub const ID: &str = "id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const VERSION_NUMBER: &str = "version_number";
    pub const CODE: &str = "code";
    pub const CHANGE_TYPE: &str = "change_type";
    pub const LINES_ADDED: &str = "lines_added";
    pub const LINES_REMOVED: &str = "lines_removed";
    pub const SUMMARY: &str = "summary";
    pub const AUTHOR_ID: &str = "author_id";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for tags table
pub mod tags {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const SLUG: &str = "slug";
    pub const USAGE_COUNT: &str = "usage_count";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for snippet_tags table
pub mod snippet_tags {
    pub const ID: &str = "id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const TAG_ID: &str = "tag_id";
}

// Column names for shares table
pub mod shares {
    pub const ID: &str = "id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const GRANTER_ID: &str = "granter_id";
    pub const SHARE_TYPE: &str = "share_type";
    pub const GRANTEE_USER_ID: &str = "grantee_user_id";
    pub const GRANTEE_TEAM_ID: &str = "grantee_team_id";
    pub const GRANTEE_EMAIL: &str = "grantee_email";
    pub const PERMISSION: &str = "permission";
    pub const TOKEN: &str = "token";
    pub const EXPIRES_AT: &str = "expires_at";
    pub const ACCESS_COUNT: &str = "access_count";
    pub const LAST_ACCESSED_AT: &str = "last_accessed_at";
    pub const IS_ACTIVE: &str = "is_active";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for favorites table
pub mod favorites {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for follows table
pub mod follows {
    pub const ID: &str = "id";
    pub const FOLLOWER_ID: &str = "follower_id";
    pub const FOLLOWED_ID: &str = "followed_id";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for comments table
pub mod comments {
    pub const ID: &str = "id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const AUTHOR_ID: &str = "author_id";
    pub const BODY: &str = "body";
    pub const PARENT_ID: &str = "parent_id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const DELETED_AT: &str = "deleted_at";
}

// Column names for collections table
pub mod collections {
    pub const ID: &str = "id";
    pub const OWNER_ID: &str = "owner_id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const IS_PUBLIC: &str = "is_public";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

// Column names for collection_snippets table
pub mod collection_snippets {
    pub const ID: &str = "id";
    pub const COLLECTION_ID: &str = "collection_id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const POSITION: &str = "position";
    pub const ADDED_AT: &str = "added_at";
}

// Column names for notifications table
pub mod notifications {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const KIND: &str = "kind";
    pub const SUBJECT: &str = "subject";
    pub const DATA: &str = "data";
    pub const READ_AT: &str = "read_at";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for audit_logs table
pub mod audit_logs {
    pub const ID: &str = "id";
    pub const ACTOR_ID: &str = "actor_id";
    pub const ACTION: &str = "action";
    pub const ENTITY_KIND: &str = "entity_kind";
    pub const ENTITY_ID: &str = "entity_id";
    pub const DETAIL: &str = "detail";
    pub const CREATED_AT: &str = "created_at";
}

// Column names for snippet_views table
pub mod snippet_views {
    pub const ID: &str = "id";
    pub const SNIPPET_ID: &str = "snippet_id";
    pub const FINGERPRINT: &str = "fingerprint";
    pub const HITS: &str = "hits";
    pub const FIRST_SEEN_AT: &str = "first_seen_at";
    pub const LAST_SEEN_AT: &str = "last_seen_at";
}
