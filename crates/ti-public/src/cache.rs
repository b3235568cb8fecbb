//! Attachment cache priming for the main query

use std::collections::{BTreeSet, HashSet};
use ti_core::{AttachmentId, ImageType, PostId, RequestContext, TermRef};

/// Collect the featured images of every term attached to `posts` and
/// ask the host to prime its attachment cache with them in one batch
///
/// Returns the ids primed, in first-seen order.
pub fn prime_queried_images(context: &RequestContext, posts: &[PostId]) -> Vec<AttachmentId> {
    let host = context.host();
    let featured = ImageType::featured();

    let mut seen_terms = HashSet::new();
    let mut terms: Vec<TermRef> = Vec::new();
    for &post in posts {
        for taxonomy in host.object_taxonomies(post) {
            for term in host.object_terms(post, &taxonomy) {
                let term = TermRef::resolved(term.term_id.0, term.taxonomy);
                if seen_terms.insert(term.clone()) {
                    terms.push(term);
                }
            }
        }
    }

    let mut seen_ids = BTreeSet::new();
    let ids: Vec<AttachmentId> = terms
        .iter()
        .filter_map(|term| context.images().get_image_id(term, &featured))
        .filter(|id| seen_ids.insert(*id))
        .collect();

    if ids.is_empty() {
        return ids;
    }
    tracing::debug!(terms = terms.len(), images = ids.len(), "priming term image cache");
    host.prime_attachments(&ids);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ti_test_utils::{attachment, category_fixture, context};

    #[test]
    fn primes_images_across_taxonomies_once() {
        let host = category_fixture();
        let context = context(&host);
        let featured = ImageType::featured();
        context.images().update_image_id(&TermRef::by_id(7), 99, &featured).unwrap();
        context.images().update_image_id(&TermRef::by_id(8), 99, &featured).unwrap();
        context.images().update_image_id(&TermRef::by_id(9), 100, &featured).unwrap();

        let primed = prime_queried_images(&context, &[PostId(1), PostId(1)]);
        assert_eq!(primed, [attachment(99), attachment(100)]);
        assert_eq!(host.primed_attachments(), primed);
    }

    #[test]
    fn nothing_to_prime() {
        let host = category_fixture();
        let context = context(&host);
        assert!(prime_queried_images(&context, &[PostId(1), PostId(2)]).is_empty());
        assert!(prime_queried_images(&context, &[]).is_empty());
        assert!(host.primed_attachments().is_empty());
    }
}
