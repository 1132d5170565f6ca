//! Best-effort mapping between the value model and external object shapes.
//!
//! Instead of scanning live type metadata, a bindable type declares a static
//! [`Shape`] (constructors and members by name) and implements [`Reflect`] to
//! read, write and construct instances. Incoming dictionary keys rarely match
//! declared names exactly, so [`from_value`] pairs them up by minimizing a
//! normalized edit distance, prefers the constructor whose parameter count
//! matches the key count, and assigns leftover keys to settable members. The
//! assignment is a documented heuristic: ambiguous names can land on the
//! wrong member.

use failure::Error;

use crate::{
    config::Config,
    dict::Dict,
    encoding,
    errors::BindError,
    Value,
};

/// A statically declared description of an external type.
#[derive(Copy, Clone, Debug)]
pub struct Shape {
    pub name: &'static str,
    pub constructors: &'static [Ctor],
    pub members: &'static [Member],
}

/// A constructor, described by its ordered parameter names.
#[derive(Copy, Clone, Debug)]
pub struct Ctor {
    pub params: &'static [&'static str],
}

/// A gettable/settable member of a shape.
#[derive(Copy, Clone, Debug)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
    pub readonly: bool,
    pub public: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MemberKind {
    Field,
    Property,
}

impl Member {
    fn visible(&self, config: &Config) -> bool {
        if self.kind == MemberKind::Field && !config.include_fields {
            return false;
        }
        if self.readonly && !config.include_readonly_members {
            return false;
        }
        if !self.public && !config.include_private_members {
            return false;
        }
        true
    }
}

/// The capability a bindable type supplies: its shape, member access and
/// construction.
pub trait Reflect: Sized {
    fn shape() -> &'static Shape;

    /// Reads a member as a value.
    fn get(&self, member: &str) -> Option<Value>;

    /// Invokes a constructor by index with one optional argument per
    /// parameter (`None` when no key matched it), or the parameterless path
    /// when `ctor` is `None`.
    fn construct(ctor: Option<usize>, args: &[Option<Value>], config: &Config) -> Option<Self>;

    /// Writes a settable member after construction.
    fn set(&mut self, member: &str, value: &Value, config: &Config);
}

/// Walks an object's visible members into a dictionary value.
pub fn to_value<T: Reflect>(object: &T, config: &Config) -> Value {
    let mut dict = Dict::with_config(config);
    for member in T::shape().members.iter().filter(|m| m.visible(config)) {
        dict.insert(member.name, object.get(member.name).unwrap_or(Value::Null));
    }
    Value::Dict(dict)
}

/// Reconstructs an object from a value via edit-distance key assignment.
pub fn from_value<T: Reflect>(value: &Value, config: &Config) -> Result<T, Error> {
    let shape = T::shape();
    let dict = Dict::cast(value)
        .ok_or(BindError::NoViableConstructor { type_name: shape.name })?;

    let keys: Vec<String> = dict.keys().map(str::to_owned).collect();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let members: Vec<&Member> = shape
        .members
        .iter()
        .filter(|m| m.visible(config))
        .collect();
    let member_names: Vec<&str> = members.iter().map(|m| m.name).collect();

    let key_to_member = minimal_pairs(&key_refs, &member_names).0;

    // score every constructor by assignment cost, preferring matching arity
    let mut best: Option<(usize, Vec<(usize, usize)>, u32)> = None;
    for (ci, ctor) in shape.constructors.iter().enumerate() {
        let (pairs, mut score) = minimal_pairs(ctor.params, &key_refs);
        score += 3 * (ctor.params.len() as i64 - keys.len() as i64).unsigned_abs() as u32;
        if best.as_ref().map_or(true, |(_, _, s)| score < *s) {
            best = Some((ci, pairs, score));
        }
    }

    let mut used_keys = vec![false; keys.len()];
    let instance = match best {
        Some((ci, pairs, _)) => {
            let params = shape.constructors[ci].params;
            let mut args: Vec<Option<Value>> = vec![None; params.len()];
            for (pi, ki) in pairs {
                args[pi] = dict.get_exact(&keys[ki]).cloned();
                used_keys[ki] = true;
            }
            T::construct(Some(ci), &args, config)
        }
        None => T::construct(None, &[], config),
    };

    let mut instance =
        instance.ok_or(BindError::NoViableConstructor { type_name: shape.name })?;

    // leftover keys land on settable members
    for (ki, mi) in key_to_member {
        if used_keys[ki] || members[mi].readonly {
            continue;
        }
        if let Some(v) = dict.get_exact(&keys[ki]) {
            instance.set(members[mi].name, v, config);
        }
    }

    Ok(instance)
}

/// Encodes an object through the binder.
pub fn serialize<T: Reflect>(object: &T, config: &Config) -> Result<Vec<u8>, Error> {
    encoding::encode_full(&to_value(object, config), config)
}

/// Encodes an object through the binder into an existing sink.
pub fn serialize_into<T: Reflect>(
    object: &T,
    config: &Config,
    out: &mut Vec<u8>,
) -> Result<(), Error> {
    encoding::encode(&to_value(object, config), config, out)
}

/// Decodes an object through the binder.
pub fn deserialize<T: Reflect, B: bytes::IntoBuf>(bytes: B, config: &Config) -> Result<T, Error> {
    let value = encoding::decode_full(bytes, config)?;
    from_value(&value, config)
}

/// Case-, whitespace- and punctuation-normalized Levenshtein distance.
pub fn distance(first: &str, second: &str) -> u32 {
    let a = normalize(first);
    let b = normalize(second);

    let mut previous: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j]
            } else {
                previous[j]
                    .min(previous[j + 1])
                    .min(current[j])
                    + 1
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

fn normalize(s: &str) -> Vec<char> {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect()
}

/// Greedily pairs rows with columns by ascending distance; each row and
/// column participates at most once. Returns the pairs and their summed
/// distance. The pairwise matrix is order-independent and could be filled
/// concurrently; it is computed sequentially here.
fn minimal_pairs(xs: &[&str], ys: &[&str]) -> (Vec<(usize, usize)>, u32) {
    let matrix: Vec<Vec<u32>> = xs
        .iter()
        .map(|x| ys.iter().map(|y| distance(x, y)).collect())
        .collect();

    let mut rows: Vec<usize> = (0..xs.len()).collect();
    let mut cols: Vec<usize> = (0..ys.len()).collect();
    let mut pairs = Vec::with_capacity(rows.len().min(cols.len()));
    let mut sum = 0;

    for _ in 0..xs.len().min(ys.len()) {
        let mut min = u32::max_value();
        let mut chosen = (0, 0);
        for (ri, row) in rows.iter().enumerate() {
            for (ci, col) in cols.iter().enumerate() {
                if matrix[*row][*col] < min {
                    min = matrix[*row][*col];
                    chosen = (ri, ci);
                }
            }
        }
        let row = rows.remove(chosen.0);
        let col = cols.remove(chosen.1);
        pairs.push((row, col));
        sum += matrix[row][col];
    }

    (pairs, sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_full, encode_full};

    #[derive(Clone, Debug, PartialEq, Default)]
    struct Employee {
        name: String,
        age: i64,
        active: bool,
    }

    static EMPLOYEE_SHAPE: Shape = Shape {
        name: "Employee",
        constructors: &[Ctor {
            params: &["name", "age"],
        }],
        members: &[
            Member {
                name: "name",
                kind: MemberKind::Property,
                readonly: false,
                public: true,
            },
            Member {
                name: "age",
                kind: MemberKind::Property,
                readonly: false,
                public: true,
            },
            Member {
                name: "active",
                kind: MemberKind::Field,
                readonly: false,
                public: true,
            },
        ],
    };

    impl Reflect for Employee {
        fn shape() -> &'static Shape { &EMPLOYEE_SHAPE }

        fn get(&self, member: &str) -> Option<Value> {
            match member {
                "name" => Some(Value::from(self.name.as_str())),
                "age" => Some(Value::from(self.age)),
                "active" => Some(Value::from(self.active)),
                _ => None,
            }
        }

        fn construct(
            ctor: Option<usize>,
            args: &[Option<Value>],
            _config: &Config,
        ) -> Option<Employee> {
            match ctor {
                Some(0) => Some(Employee {
                    name: args
                        .get(0)
                        .and_then(|a| a.as_ref())
                        .and_then(crate::text::Text::cast)
                        .and_then(|t| t.decoded())
                        .unwrap_or_default(),
                    age: args
                        .get(1)
                        .and_then(|a| a.as_ref())
                        .and_then(crate::inum::Inum::cast)
                        .and_then(|i| i.to_i64())
                        .unwrap_or_default(),
                    active: false,
                }),
                None => Some(Employee::default()),
                _ => None,
            }
        }

        fn set(&mut self, member: &str, value: &Value, _config: &Config) {
            match member {
                "name" => {
                    if let Some(s) = crate::text::Text::cast(value).and_then(|t| t.decoded()) {
                        self.name = s;
                    }
                }
                "age" => {
                    if let Some(i) = crate::inum::Inum::cast(value).and_then(|i| i.to_i64()) {
                        self.age = i;
                    }
                }
                "active" => {
                    if let Value::Bool(b) = value {
                        self.active = *b;
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn distances_normalize_names() {
        assert_eq!(distance("first_name", "FirstName"), 0);
        assert_eq!(distance(" is-active ", "isActive"), 0);
        assert!(distance("width", "height") > 0);
    }

    #[test]
    fn minimal_pairs_prefers_identical_names() {
        let (pairs, sum) = minimal_pairs(&["alpha", "beta"], &["beta", "alpha"]);
        assert_eq!(sum, 0);
        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(1, 0)));
    }

    #[test]
    fn object_round_trips_through_the_codec() {
        let config = Config::default();
        let employee = Employee {
            name: "Grace".to_string(),
            age: 47,
            active: true,
        };

        let bytes = serialize(&employee, &config).unwrap();
        let back: Employee = deserialize(&bytes[..], &config).unwrap();
        assert_eq!(back, employee);
    }

    #[test]
    fn fuzzy_keys_still_bind() {
        let config = Config::default();
        let mut d = Dict::new(true, false);
        d.insert("Name", Value::from("Ada"));
        d.insert("AGE", Value::from(36));
        d.insert("is-active", Value::from(true));

        let employee: Employee = from_value(&Value::Dict(d), &config).unwrap();
        assert_eq!(employee.name, "Ada");
        assert_eq!(employee.age, 36);
        // "is-active" normalizes to "isactive", closest to "active"
        assert!(employee.active);
    }

    #[test]
    fn non_dictionaries_do_not_bind() {
        let config = Config::default();
        let err = from_value::<Employee>(&Value::Null, &config).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BindError>(),
            Some(&BindError::NoViableConstructor { type_name: "Employee" })
        );
    }

    #[test]
    fn visibility_flags_filter_members() {
        let employee = Employee {
            name: "Linus".to_string(),
            age: 55,
            active: true,
        };
        let no_fields = Config {
            include_fields: false,
            ..Config::default()
        };
        match to_value(&employee, &no_fields) {
            Value::Dict(d) => {
                assert!(d.get("name").is_some());
                assert!(d.get("active").is_none());
            }
            other => panic!("expected a dictionary, got {:?}", other),
        }
    }

    #[test]
    fn binder_output_survives_the_wire() {
        let config = Config::default();
        let employee = Employee {
            name: "Annie".to_string(),
            age: 29,
            active: false,
        };
        let v = to_value(&employee, &config);
        let bytes = encode_full(&v, &config).unwrap();
        assert_eq!(decode_full(&bytes, &config).unwrap(), v);
    }
}
