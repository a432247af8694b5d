pub mod attack;
pub mod damage;
pub mod energy;
