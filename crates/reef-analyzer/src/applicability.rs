//! Entity Framework applicability detection.

/// Returns `true` when Entity Framework is likely in use.
///
/// Dependency coordinates are checked first, then a lightweight source
/// scan for the EF namespace and the context/set vocabulary. This is the
/// cheap front gate that keeps analysis away from unrelated code.
pub fn is_ef_applicable(dependencies: &[&str], sources: &[&str]) -> bool {
    let dep_hit = dependencies.iter().any(|dep| {
        dep.contains("EntityFramework") || dep.contains("System.Data.Entity")
    });
    if dep_hit {
        return true;
    }

    sources.iter().any(|src| {
        src.contains("System.Data.Entity")
            || src.contains("DbContext")
            || src.contains("DbSet<")
            || src.contains("IDbSet<")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_coordinates_win() {
        assert!(is_ef_applicable(&["EntityFramework/6.4.4"], &[]));
        assert!(!is_ef_applicable(&["Newtonsoft.Json/13.0.1"], &[]));
    }

    #[test]
    fn source_markers_are_scanned() {
        assert!(is_ef_applicable(&[], &["using System.Data.Entity;"]));
        assert!(is_ef_applicable(
            &[],
            &["public class C : DbContext { }"]
        ));
        assert!(!is_ef_applicable(&[], &["public class C { }"]));
    }
}
