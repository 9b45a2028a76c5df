mod e2e_burn;
mod e2e_flow;
mod utils;
