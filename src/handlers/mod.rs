// Handlers are split by access tier:
// public routes need no credentials, protected routes check identity and role
// inside each handler. Identity itself is resolved once by the identity middleware.
pub mod protected;
pub mod public;
