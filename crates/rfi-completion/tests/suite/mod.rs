mod keywords;
mod libraries;
mod replies;
mod variables;
