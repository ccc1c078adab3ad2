mod documents;
mod terms;
