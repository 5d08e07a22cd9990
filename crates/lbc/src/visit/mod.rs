//! Walking the IR
//!
//! The passes rewrite strings wherever they occur in the tree. Rather than
//! matching on every IR type, they hand a closure to [VisitStringsMut].
mod visit_strings;
pub use visit_strings::VisitStringsMut;

/// Visitor that visits its subjects mutably
pub trait VisitMut<T> {
    fn visit_mut(&mut self, value: &mut T);
}

impl<T, F> VisitMut<T> for F
where
    F: FnMut(&mut T),
{
    fn visit_mut(&mut self, value: &mut T) {
        self(value)
    }
}

/// Rewrite every string of `target` that holds a `${`
///
/// Stops rewriting at the first error and returns it. On success returns
/// how many strings were rewritten.
pub fn rewrite_templated<E>(
    target: &mut impl VisitStringsMut,
    mut rewrite: impl FnMut(&str) -> Result<String, E>,
) -> Result<usize, E> {
    let mut error = None;
    let mut rewritten = 0;
    target.visit_strings_mut(&mut |s: &mut String| {
        if error.is_some() || !s.contains("${") {
            return;
        }
        match rewrite(s) {
            Ok(value) => {
                *s = value;
                rewritten += 1;
            }
            Err(e) => error = Some(e),
        }
    });

    match error {
        Some(error) => Err(error),
        None => Ok(rewritten),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_only_templated_strings() {
        let mut strings = vec!["plain".to_string(), "${a}".to_string(), "x${b}".to_string()];

        let count = rewrite_templated(&mut strings, |s| Ok::<_, ()>(s.replace("${", "<")));

        assert_eq!(count, Ok(2));
        assert_eq!(strings, vec!["plain", "<a}", "x<b}"]);
    }

    #[test]
    fn stops_at_first_error() {
        let mut strings = vec!["${bad}".to_string(), "${good}".to_string()];
        let mut seen = vec![];

        let result = rewrite_templated(&mut strings, |s| {
            seen.push(s.to_string());
            Err(format!("cannot rewrite {s}"))
        });

        assert_eq!(result, Err("cannot rewrite ${bad}".to_string()));
        assert_eq!(seen, vec!["${bad}"]);
        assert_eq!(strings, vec!["${bad}", "${good}"]);
    }
}
