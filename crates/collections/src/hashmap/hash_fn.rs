use std::{
    convert::Infallible,
    fmt,
    hash::{DefaultHasher, Hash, Hasher},
    str::FromStr,
};

/// What the hash functions need to know about a key:
/// its textual form and a structural hash to fall back on
/// when the text is not an integer.
///
/// Implemented for everything that is `Display + Hash`. A borrowed form
/// (`str` for `String`) renders and hashes the same as the owned key,
/// so lookups through `Borrow` land in the same bucket.
pub trait TableKey {
    fn text(&self) -> String;

    /// `std::hash::Hash` of the key fed to a fixed-key `DefaultHasher`.
    /// Stable for the lifetime of a build, but not across toolchains,
    /// so bucket placement of non-numeric keys is not part of any contract
    fn structural_hash(&self) -> i64;
}

impl<T: fmt::Display + Hash + ?Sized> TableKey for T {
    fn text(&self) -> String {
        self.to_string()
    }

    fn structural_hash(&self) -> i64 {
        let mut h = DefaultHasher::new();
        self.hash(&mut h);
        h.finish() as i64
    }
}

/// Strategy used to map a key to a bucket index in `[0, capacity)`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    /// `key mod capacity`
    #[default]
    Division,
    /// Knuth's multiplicative method with the golden ratio fraction
    Multiplication,
    /// Sum of the key's 2-character chunks
    Folding,
    /// Middle two digits of the squared key
    MidSquare,
    /// First, middle and last characters of the key glued together
    Extraction,
}

impl HashFunction {
    pub const ALL: [HashFunction; 5] = [
        HashFunction::Division,
        HashFunction::Multiplication,
        HashFunction::Folding,
        HashFunction::MidSquare,
        HashFunction::Extraction,
    ];

    /// Looks a function up by name, case-insensitively.
    /// Anything unrecognised falls back to [`HashFunction::Division`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "multiplication" => Self::Multiplication,
            "folding" => Self::Folding,
            "mid-square" | "mid_square" | "midsquare" => Self::MidSquare,
            "extraction" => Self::Extraction,
            _ => Self::Division,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Division => "division",
            Self::Multiplication => "multiplication",
            Self::Folding => "folding",
            Self::MidSquare => "mid-square",
            Self::Extraction => "extraction",
        }
    }

    /// Computes the bucket index of `key` in a table of `capacity` slots
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero
    pub fn hash<K: TableKey + ?Sized>(&self, key: &K, capacity: usize) -> usize {
        assert_ne!(capacity, 0, "hashing into a zero-capacity table");

        match self {
            Self::Division => division(key, capacity),
            Self::Multiplication => multiplication(key, capacity),
            Self::Folding => folding(&key.text(), capacity),
            Self::MidSquare => mid_square(&key.text(), capacity),
            Self::Extraction => extraction(key, capacity),
        }
    }
}

impl FromStr for HashFunction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// [variants]

fn division<K: TableKey + ?Sized>(key: &K, capacity: usize) -> usize {
    coerce(key).rem(capacity)
}

fn multiplication<K: TableKey + ?Sized>(key: &K, capacity: usize) -> usize {
    let a = (5f64.sqrt() - 1.0) / 2.0;
    let frac = (coerce(key).to_f64() * a).rem_euclid(1.0);
    // rem_euclid may round up to exactly 1.0, keys past f64 range give NaN
    ((capacity as f64 * frac) as usize).min(capacity - 1)
}

fn folding(text: &str, capacity: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let sum: i64 = chars
        .chunks(2)
        .map(|chunk| {
            let part: String = chunk.iter().collect();
            parse_int(&part).unwrap_or_else(|| char_code_sum(&part))
        })
        .sum();

    reduce(sum, capacity)
}

fn mid_square(text: &str, capacity: usize) -> usize {
    let n = Decimal::parse(text).unwrap_or_else(|| Decimal::from_i64(char_code_sum(text)));
    let digits = n.squared();

    let mid = digits.len() / 2;
    let middle = if mid >= 1 {
        &digits[mid - 1..mid + 1]
    } else {
        &digits[..]
    };

    let value = middle.iter().fold(0usize, |acc, &d| acc * 10 + d as usize);
    value % capacity
}

fn extraction<K: TableKey + ?Sized>(key: &K, capacity: usize) -> usize {
    let chars: Vec<char> = key.text().chars().collect();
    if chars.len() < 3 {
        return division(key, capacity);
    }

    let picked: String = [chars[0], chars[chars.len() / 2], chars[chars.len() - 1]]
        .iter()
        .collect();
    let value = parse_int(&picked).unwrap_or_else(|| char_code_sum(&picked));
    reduce(value, capacity)
}

// [private]

/// Integer value of the key, or its structural hash if the text is not numeric
fn coerce<K: TableKey + ?Sized>(key: &K) -> Decimal {
    Decimal::parse(&key.text()).unwrap_or_else(|| Decimal::from_i64(key.structural_hash()))
}

/// Short numeric text (folding chunks, extracted characters) as an `i64`
fn parse_int(s: &str) -> Option<i64> {
    Decimal::parse(s)?.to_i64()
}

fn char_code_sum(s: &str) -> i64 {
    s.chars().map(|c| c as i64).sum()
}

/// Non-negative `value mod capacity`
fn reduce(value: i64, capacity: usize) -> usize {
    (value as i128).rem_euclid(capacity as i128) as usize
}

/// Integer of any length, kept as decimal digits so numeric keys
/// wider than a machine word still hash by value
#[derive(Debug, Clone, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    /// Most significant first, no leading zeros, zero is `[0]`
    digits: Vec<u8>,
}

impl Decimal {
    /// Accepts surrounding whitespace, an optional sign, and digits
    /// with single underscores between them (`1_000`)
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, body) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        if body.is_empty() || body.starts_with('_') || body.ends_with('_') || body.contains("__") {
            return None;
        }

        let mut digits = Vec::with_capacity(body.len());
        for b in body.bytes() {
            match b {
                b'0'..=b'9' => digits.push(b - b'0'),
                b'_' => {}
                _ => return None,
            }
        }

        Some(Self::normalized(negative, digits))
    }

    fn from_i64(n: i64) -> Self {
        let digits = n.unsigned_abs().to_string().bytes().map(|b| b - b'0').collect();
        Self::normalized(n < 0, digits)
    }

    fn normalized(negative: bool, mut digits: Vec<u8>) -> Self {
        let zeros = digits.iter().take_while(|&&d| d == 0).count();
        digits.drain(..zeros.min(digits.len() - 1));
        let negative = negative && digits != [0];
        Self { negative, digits }
    }

    fn to_i64(&self) -> Option<i64> {
        let magnitude = self
            .digits
            .iter()
            .try_fold(0i128, |acc, &d| acc.checked_mul(10)?.checked_add(d as i128))?;
        let value = if self.negative { -magnitude } else { magnitude };
        i64::try_from(value).ok()
    }

    /// Nearest `f64`, infinite past its range
    fn to_f64(&self) -> f64 {
        let text: String = self.digits.iter().map(|&d| (b'0' + d) as char).collect();
        let magnitude: f64 = text.parse().unwrap_or(f64::INFINITY);
        if self.negative { -magnitude } else { magnitude }
    }

    /// Non-negative `self mod modulus`, reduced digit by digit
    fn rem(&self, modulus: usize) -> usize {
        let m = modulus as u128;
        let r = self
            .digits
            .iter()
            .fold(0u128, |acc, &d| (acc * 10 + d as u128) % m);

        if self.negative && r != 0 {
            (m - r) as usize
        } else {
            r as usize
        }
    }

    /// Decimal digits of `self * self`, most significant first
    fn squared(&self) -> Vec<u8> {
        let le: Vec<u32> = self.digits.iter().rev().map(|&d| d as u32).collect();
        let mut out = vec![0u32; le.len() * 2];

        for (i, &a) in le.iter().enumerate() {
            let mut carry = 0;
            for (j, &b) in le.iter().enumerate() {
                let cur = out[i + j] + a * b + carry;
                out[i + j] = cur % 10;
                carry = cur / 10;
            }
            let mut k = i + le.len();
            while carry > 0 {
                let cur = out[k] + carry;
                out[k] = cur % 10;
                carry = cur / 10;
                k += 1;
            }
        }

        while out.len() > 1 && out.last() == Some(&0) {
            out.pop();
        }
        out.iter().rev().map(|&d| d as u8).collect()
    }
}

#[cfg(test)]
mod test {
    use super::{
        Decimal,
        HashFunction::{self, *},
    };

    fn hash_all(f: HashFunction, keys: &[&str], cap: usize) -> Vec<usize> {
        keys.iter().map(|k| f.hash(*k, cap)).collect()
    }

    #[test]
    fn always_in_range() {
        let keys = [
            "", "0", "7", "-7", "12345", "aluno123", "2023-1", "chave_comprida123456",
            "joao@example.com", "ção", " 42 ", "99999999999999999999999", "-9223372036854775808",
        ];

        for cap in 1..=64 {
            for f in HashFunction::ALL {
                for key in keys {
                    let i = f.hash(key, cap);
                    assert!(i < cap, "{f} put {key:?} at {i} with capacity {cap}");
                }
                for n in [i64::MIN, -1, 0, 1, 42, i64::MAX] {
                    assert!(f.hash(&n, cap) < cap);
                }
            }
        }
    }

    #[test]
    fn deterministic() {
        for f in HashFunction::ALL {
            for key in ["chave1", "chave6", "12345", "x"] {
                assert_eq!(f.hash(key, 97), f.hash(key, 97));
                assert_eq!(f.hash(key, 97), f.hash(&key.to_string(), 97));
            }
        }
    }

    #[test]
    fn division() {
        let keys = ["12345", "-7", "2", " 42 ", "99"];
        assert_eq!(hash_all(Division, &keys, 10), [5, 3, 2, 2, 9]);
        assert_eq!(Division.hash(&12345, 10), 5);
    }

    #[test]
    fn multiplication() {
        assert_eq!(Multiplication.hash(&12345, 10), 6);
        assert_eq!(Multiplication.hash("-7", 10), 6);
        assert_eq!(Multiplication.hash(" 42 ", 10), 9);

        let keys = ["1", "2", "3", "100", "-5"];
        assert_eq!(hash_all(Multiplication, &keys, 20), [12, 4, 17, 16, 18]);
    }

    #[test]
    fn folding() {
        let keys = ["12345", "-7", "aluno123", "2023-1", "ab", "abc", " 42 ", "99"];
        assert_eq!(hash_all(Folding, &keys, 10), [1, 3, 5, 2, 5, 4, 6, 9]);
    }

    #[test]
    fn mid_square() {
        let keys = ["12345", "-7", "aluno123", "2023-1", "ab", "abc", "2", "3", "99"];
        assert_eq!(hash_all(MidSquare, &keys, 10), [9, 9, 2, 8, 0, 4, 4, 9, 0]);
        assert_eq!(MidSquare.hash("ab", 7), 3);
    }

    #[test]
    fn extraction() {
        let keys = ["12345", "aluno123", "2023-1", "abc", " 42 ", "99"];
        assert_eq!(hash_all(Extraction, &keys, 10), [5, 9, 1, 4, 2, 9]);

        // short keys go through division
        for key in ["ab", "-7", "x", ""] {
            assert_eq!(Extraction.hash(key, 13), Division.hash(key, 13));
        }
    }

    #[test]
    fn wide_numeric_keys_hash_by_value() {
        let keys = [
            "99999999999999999999999",
            "123456789012345678901234567890",
            "-98765432109876543210",
            " 1_000 ",
        ];

        assert_eq!(hash_all(Division, &keys, 10), [9, 0, 0, 0]);
        assert_eq!(hash_all(Division, &keys, 97), [55, 52, 35, 30]);
        assert_eq!(hash_all(Multiplication, &keys, 10), [0, 0, 0, 0]);
        assert_eq!(hash_all(Multiplication, &keys, 97), [0, 0, 0, 3]);
        assert_eq!(hash_all(MidSquare, &keys, 10), [0, 5, 7, 0]);
        assert_eq!(hash_all(MidSquare, &keys, 97), [80, 25, 67, 0]);
    }

    #[test]
    fn decimal_parse() {
        let d = |s: &str| Decimal::parse(s).map(|d| (d.negative, d.digits));

        assert_eq!(d("  007 "), Some((false, vec![7])));
        assert_eq!(d("-0"), Some((false, vec![0])));
        assert_eq!(d("+1_2"), Some((false, vec![1, 2])));
        assert_eq!(d("-45"), Some((true, vec![4, 5])));
        for bad in ["", "-", "_1", "1_", "1__2", "1 2", "1.5", "abc", "--1"] {
            assert_eq!(d(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn decimal_arithmetic() {
        let big = Decimal::parse("99999999999999999999999").unwrap();
        let square: String = big.squared().iter().map(|d| (b'0' + d) as char).collect();
        assert_eq!(square, format!("{}8{}1", "9".repeat(22), "0".repeat(22)));

        assert_eq!(Decimal::parse("0").unwrap().squared(), [0]);
        assert_eq!(Decimal::from_i64(-12).squared(), [1, 4, 4]);

        assert_eq!(Decimal::parse("-7").unwrap().rem(10), 3);
        assert_eq!(Decimal::parse("-20").unwrap().rem(10), 0);
        assert_eq!(Decimal::from_i64(i64::MIN).to_i64(), Some(i64::MIN));
        assert_eq!(big.to_i64(), None);
        assert_eq!(big.to_f64(), 1e23);
    }

    #[test]
    fn numeric_text_and_numbers_agree() {
        for f in HashFunction::ALL {
            assert_eq!(f.hash(&12345, 31), f.hash("12345", 31));
            assert_eq!(f.hash(&-7i32, 31), f.hash("-7", 31));
        }
    }

    #[test]
    fn names() {
        for f in HashFunction::ALL {
            assert_eq!(HashFunction::from_name(f.name()), f);
            assert_eq!(f.to_string().parse::<HashFunction>(), Ok(f));
        }

        assert_eq!(HashFunction::from_name("MID_SQUARE"), MidSquare);
        assert_eq!(HashFunction::from_name("midsquare"), MidSquare);
        assert_eq!(HashFunction::from_name("sha256"), Division);
        assert_eq!(HashFunction::from_name(""), Division);
        assert_eq!(HashFunction::default(), Division);
    }

    #[test]
    #[should_panic(expected = "zero-capacity")]
    fn zero_capacity() {
        Division.hash("k", 0);
    }
}
