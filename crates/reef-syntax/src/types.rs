use std::fmt;

/// A parsed C# type reference: a (possibly qualified) name plus generic
/// arguments. `List<Nullable<int>>` becomes
/// `TypeName { name: "List", args: [TypeName { name: "Nullable", args: [int] }] }`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub name: String,
    pub args: Vec<TypeName>,
}

impl TypeName {
    /// Parses raw type reference text. Trailing `?` and `[]` suffixes are
    /// discarded since the analyzer only matches on name and arity.
    pub fn parse(raw: &str) -> Option<TypeName> {
        let raw = raw.trim();
        let raw = raw.strip_suffix('?').unwrap_or(raw).trim();
        let raw = raw.trim_end_matches("[]").trim();
        if raw.is_empty() {
            return None;
        }

        let Some(lt) = find_top_level(raw, '<') else {
            return Some(TypeName {
                name: raw.to_string(),
                args: Vec::new(),
            });
        };
        let gt = raw.rfind('>')?;
        if gt <= lt {
            return None;
        }

        let name = raw[..lt].trim();
        if name.is_empty() {
            return None;
        }
        let inner = &raw[lt + 1..gt];
        let mut args = Vec::new();
        for part in split_top_level_commas(inner) {
            args.push(TypeName::parse(&part)?);
        }
        Some(TypeName {
            name: name.to_string(),
            args,
        })
    }

    /// The unqualified name: `System.Linq.IQueryable` yields `IQueryable`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The sole generic argument, when there is exactly one.
    pub fn single_arg(&self) -> Option<&TypeName> {
        match self.args.as_slice() {
            [arg] => Some(arg),
            _ => None,
        }
    }

    /// `var` declarations carry no usable declared type.
    pub fn is_inferred(&self) -> bool {
        self.args.is_empty() && self.name == "var"
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg:?}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

fn find_top_level(input: &str, target: char) -> Option<usize> {
    let mut depth = 0u32;
    for (idx, ch) in input.char_indices() {
        match ch {
            c if c == target && depth == 0 => return Some(idx),
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

fn split_top_level_commas(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0u32;
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    out.push(current);
    out
}
