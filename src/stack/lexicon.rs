//! Client-library lexicon
//!
//! Maps datastore client libraries to the external resource they imply.

use super::matcher::DependencyPattern::{self, Exact, Prefix};
use super::types::{Dependency, ResourceKind};

#[derive(Debug)]
pub struct LexiconEntry {
    /// Product name, used as the resource's compose service name
    pub product: &'static str,
    pub kind: ResourceKind,
    pub image: &'static str,
    pub port: u16,
    pub patterns: &'static [DependencyPattern],
    /// Mount point of the named volume for stateful kinds
    pub data_path: Option<&'static str>,
    /// Connection variable injected into dependent services
    pub env_var: &'static str,
    /// Connection string with `{host}` and `{port}` placeholders
    pub connection: &'static str,
    /// Environment the resource container itself needs
    pub image_env: &'static [(&'static str, &'static str)],
}

impl LexiconEntry {
    pub fn matches(&self, dep: &Dependency) -> bool {
        self.patterns.iter().any(|p| p.matches(dep))
    }

    pub fn connection_url(&self, host: &str) -> String {
        self.connection
            .replace("{host}", host)
            .replace("{port}", &self.port.to_string())
    }
}

pub static LEXICON: &[LexiconEntry] = &[
    LexiconEntry {
        product: "postgres",
        kind: ResourceKind::Database,
        image: "postgres:16-alpine",
        port: 5432,
        patterns: &[
            Exact("pg"),
            Exact("postgres"),
            Exact("pg-promise"),
            Exact("psycopg2"),
            Exact("psycopg2-binary"),
            Exact("psycopg"),
            Exact("asyncpg"),
            Prefix("github.com/lib/pq"),
            Prefix("github.com/jackc/pgx"),
            Exact("tokio-postgres"),
            Exact("postgres-types"),
            Exact("org.postgresql:postgresql"),
        ],
        data_path: Some("/var/lib/postgresql/data"),
        env_var: "DATABASE_URL",
        connection: "postgres://postgres:postgres@{host}:{port}/app",
        image_env: &[
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "postgres"),
            ("POSTGRES_DB", "app"),
        ],
    },
    LexiconEntry {
        product: "mysql",
        kind: ResourceKind::Database,
        image: "mysql:8",
        port: 3306,
        patterns: &[
            Exact("mysql"),
            Exact("mysql2"),
            Exact("pymysql"),
            Exact("mysqlclient"),
            Prefix("github.com/go-sql-driver/mysql"),
            Exact("mysql_async"),
            Exact("com.mysql:mysql-connector-j"),
            Exact("mysql:mysql-connector-java"),
        ],
        data_path: Some("/var/lib/mysql"),
        env_var: "DATABASE_URL",
        connection: "mysql://root:mysql@{host}:{port}/app",
        image_env: &[("MYSQL_ROOT_PASSWORD", "mysql"), ("MYSQL_DATABASE", "app")],
    },
    LexiconEntry {
        product: "mongo",
        kind: ResourceKind::Database,
        image: "mongo:7",
        port: 27017,
        patterns: &[
            Exact("mongodb"),
            Exact("mongoose"),
            Exact("pymongo"),
            Exact("motor"),
            Prefix("go.mongodb.org/mongo-driver"),
            Exact("org.mongodb:mongodb-driver-sync"),
            Exact("mongoid"),
        ],
        data_path: Some("/data/db"),
        env_var: "MONGO_URL",
        connection: "mongodb://{host}:{port}/app",
        image_env: &[],
    },
    LexiconEntry {
        product: "redis",
        kind: ResourceKind::Cache,
        image: "redis:7-alpine",
        port: 6379,
        patterns: &[
            Exact("redis"),
            Exact("ioredis"),
            Exact("@redis/client"),
            Prefix("github.com/redis/go-redis"),
            Prefix("github.com/go-redis/redis"),
            Exact("org.springframework.boot:spring-boot-starter-data-redis"),
            Exact("predis/predis"),
        ],
        data_path: None,
        env_var: "REDIS_URL",
        connection: "redis://{host}:{port}",
        image_env: &[],
    },
    LexiconEntry {
        product: "memcached",
        kind: ResourceKind::Cache,
        image: "memcached:1.6-alpine",
        port: 11211,
        patterns: &[
            Exact("memcached"),
            Exact("pymemcache"),
            Exact("dalli"),
            Prefix("github.com/bradfitz/gomemcache"),
        ],
        data_path: None,
        env_var: "MEMCACHED_URL",
        connection: "{host}:{port}",
        image_env: &[],
    },
    LexiconEntry {
        product: "rabbitmq",
        kind: ResourceKind::Queue,
        image: "rabbitmq:3-management-alpine",
        port: 5672,
        patterns: &[
            Exact("amqplib"),
            Exact("amqp-connection-manager"),
            Exact("pika"),
            Exact("aio-pika"),
            Exact("lapin"),
            Prefix("github.com/rabbitmq/amqp091-go"),
            Exact("org.springframework.boot:spring-boot-starter-amqp"),
            Exact("bunny"),
            Exact("php-amqplib/php-amqplib"),
        ],
        data_path: Some("/var/lib/rabbitmq"),
        env_var: "AMQP_URL",
        connection: "amqp://guest:guest@{host}:{port}",
        image_env: &[],
    },
    LexiconEntry {
        product: "kafka",
        kind: ResourceKind::Queue,
        image: "bitnami/kafka:3.7",
        port: 9092,
        patterns: &[
            Exact("kafkajs"),
            Exact("kafka-python"),
            Exact("confluent-kafka"),
            Exact("rdkafka"),
            Prefix("github.com/segmentio/kafka-go"),
            Prefix("github.com/confluentinc/confluent-kafka-go"),
            Exact("org.apache.kafka:kafka-clients"),
            Exact("org.springframework.kafka:spring-kafka"),
        ],
        data_path: Some("/bitnami/kafka"),
        env_var: "KAFKA_BROKERS",
        connection: "{host}:{port}",
        image_env: &[
            ("KAFKA_CFG_NODE_ID", "0"),
            ("KAFKA_CFG_PROCESS_ROLES", "controller,broker"),
            ("KAFKA_CFG_LISTENERS", "PLAINTEXT://:9092,CONTROLLER://:9093"),
            ("KAFKA_CFG_CONTROLLER_QUORUM_VOTERS", "0@localhost:9093"),
            ("KAFKA_CFG_CONTROLLER_LISTENER_NAMES", "CONTROLLER"),
        ],
    },
];

/// Lexicon entry implied by a dependency, if any
pub fn lookup(dep: &Dependency) -> Option<&'static LexiconEntry> {
    LEXICON.iter().find(|entry| entry.matches(dep))
}
