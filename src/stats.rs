//! Aggregates over an already fetched collection of posts.
//!
//! Every function is pure. Ties are always resolved in favour of the *last*
//! candidate, in input order for posts and in first-seen order for authors.
//! Like totals saturate at `u64::MAX` instead of wrapping or panicking.

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::BlogPost;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorPosts {
    pub author: String,
    pub blogs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorLikes {
    pub author: String,
    pub likes: u64,
}

pub fn total_likes(posts: &[BlogPost]) -> u64 {
    posts.iter().fold(0, |sum, p| sum.saturating_add(p.likes))
}

pub fn favorite_post(posts: &[BlogPost]) -> Option<&BlogPost> {
    // `max_by_key` returns the last maximum on ties
    posts.iter().max_by_key(|p| p.likes)
}

pub fn most_prolific_author(posts: &[BlogPost]) -> Option<AuthorPosts> {
    let counts = group_by_author(posts, |count: &mut usize, _| *count += 1);
    last_max(counts).map(|(author, blogs)| AuthorPosts {
        author: author.to_owned(),
        blogs,
    })
}

pub fn most_liked_author(posts: &[BlogPost]) -> Option<AuthorLikes> {
    let likes = group_by_author(posts, |sum: &mut u64, p| {
        *sum = sum.saturating_add(p.likes);
    });
    last_max(likes).map(|(author, likes)| AuthorLikes {
        author: author.to_owned(),
        likes,
    })
}

/// Single pass accumulation keyed by the raw author string.
/// Iteration order of the result is first-seen order.
fn group_by_author<'a, A, F>(posts: &'a [BlogPost], mut fold: F) -> IndexMap<&'a str, A>
where
    A: Default,
    F: FnMut(&mut A, &BlogPost),
{
    let mut groups = IndexMap::new();
    for post in posts {
        fold(groups.entry(post.author.as_str()).or_default(), post);
    }
    groups
}

fn last_max<K, V: Ord + Copy>(groups: IndexMap<K, V>) -> Option<(K, V)> {
    groups.into_iter().max_by_key(|(_, v)| *v)
}
