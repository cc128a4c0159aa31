/// Cases per page when the client does not ask for a size
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `page_size` on list endpoints
pub const MAX_PAGE_SIZE: i64 = 100;
