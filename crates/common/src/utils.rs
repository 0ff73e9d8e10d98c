/// Pull the token out of a link such as `http://host/download/<token>`.
/// Input without a `/` is taken to be the bare token.
pub fn token_from_link(link: &str) -> &str {
    let trimmed = link.trim().trim_end_matches('/');
    let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}
