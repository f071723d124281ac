pub mod auth {
    pub mod model;
    pub mod otp;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod user {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod image {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod university {
    pub mod schema;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod explore {
    pub mod scoring;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod matching {
    pub mod adjectives;
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod connection {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod notification {
    pub mod model;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod conversation {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod message {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod event {
    pub mod schema;
    pub mod payment;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod websocket;
