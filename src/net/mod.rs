//! # 带标签的 Petri 网（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`。每个迁移 `t` 携带一个弧向量
//! `C[:, t] ∈ ℤ^{|P|}` 与一个可观察标签。对任意标识 `M ∈ ℕ^{|P|}`：
//!
//! * 迁移 `t` **可激发** 当且仅当 `∀p ∈ P: M[p] + C[p, t] ≥ 0`；
//! * 迁移 **发射** 后标识为 `M' = M + C[:, t]`，原标识保持不变。
//!
//! ## 示例
//!
//! ```rust
//! use pn_complement::net::*;
//!
//! let mut net = Net::empty();
//! let p0 = net.add_place(Place::new("p0"));
//! let p1 = net.add_place(Place::new("p1"));
//! let t0 = net.add_transition(Transition::new("t0", "a"));
//! net.set_arc_vector(t0, &[-1, 1]);
//!
//! let marking = net.marking(&[1, 0]).unwrap();
//! assert_eq!(net.enabled_transitions(&marking), vec![t0]);
//! let next = net.fire(&marking, t0).unwrap();
//! assert_eq!(next.tokens(p0), 0);
//! assert_eq!(next.tokens(p1), 1);
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use self::core::{FireError, Net, NetError};
pub use self::ids::{PlaceId, StateId, TransitionId};
pub use self::incidence::Incidence;
pub use self::index_vec::{Idx, IndexVec};
pub use self::structure::{Effect, Marking, Place, Tokens, Transition};
