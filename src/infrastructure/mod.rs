pub mod github;
pub mod redis;

pub use self::github::GitHubClient;
pub use self::redis::RedisRepository;
